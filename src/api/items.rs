use rocket::{http::Status, serde::json::Json, Route, State};

use crate::{
    error::Result,
    model::{
        api::{
            caller::Caller,
            item::{VotingItemDescription, VotingItemSpec, VotingItemSummary},
            pagination::{Paginated, Pagination},
            vote::VoteRequest,
        },
        common::voter::Votes,
    },
    registry::VotingRegistry,
};

pub fn routes() -> Vec<Route> {
    routes![
        create_item,
        cast_vote,
        end_voting,
        cancel_voting,
        current_votes,
        is_canceled,
        voting_item,
        voting_items,
    ]
}

#[post("/items", data = "<spec>", format = "json")]
async fn create_item(
    spec: Json<VotingItemSpec>,
    registry: &State<VotingRegistry>,
) -> Result<Status> {
    let spec = spec.into_inner();
    registry
        .create_voting_item(
            spec.item_id,
            spec.item_name,
            spec.options,
            spec.start_time,
            spec.end_time,
        )
        .await?;
    Ok(Status::Created)
}

#[post("/items/<item_id>/votes", data = "<vote>", format = "json")]
async fn cast_vote(
    caller: Caller,
    item_id: &str,
    vote: Json<VoteRequest>,
    registry: &State<VotingRegistry>,
) -> Result<()> {
    registry
        .cast_vote(item_id, &vote.option, caller.voter())
        .await
}

#[post("/items/<item_id>/end")]
async fn end_voting(item_id: &str, registry: &State<VotingRegistry>) -> Result<()> {
    registry.end_voting(item_id).await
}

#[post("/items/<item_id>/cancel")]
async fn cancel_voting(item_id: &str, registry: &State<VotingRegistry>) -> Result<()> {
    registry.cancel_voting(item_id).await
}

#[get("/items/<item_id>/votes")]
async fn current_votes(item_id: &str, registry: &State<VotingRegistry>) -> Result<Json<Votes>> {
    Ok(Json(registry.current_votes(item_id).await?))
}

#[get("/items/<item_id>/canceled")]
async fn is_canceled(item_id: &str, registry: &State<VotingRegistry>) -> Result<Json<bool>> {
    Ok(Json(registry.is_canceled(item_id).await?))
}

#[get("/items/<item_id>")]
async fn voting_item(
    item_id: &str,
    registry: &State<VotingRegistry>,
) -> Result<Json<VotingItemDescription>> {
    let snapshot = registry.voting_item(item_id).await?;
    Ok(Json(snapshot.into()))
}

#[get("/items")]
async fn voting_items(
    pagination: Pagination,
    registry: &State<VotingRegistry>,
) -> Result<Json<Paginated<VotingItemSummary>>> {
    let (items, total) = registry
        .voting_items(pagination.skip(), pagination.page_size())
        .await?;
    let summaries = items.into_iter().map(VotingItemSummary::from).collect();
    Ok(Json(pagination.paginate(summaries, total)))
}
