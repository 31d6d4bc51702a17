use rocket::{
    http::Status,
    request::{self, FromRequest, Request},
};
use serde::{Deserialize, Serialize};

use crate::config::Config;

const DEFAULT_PAGE_SIZE: u64 = 50;

/// Which page of a listing was requested, taken from the `page_num` and
/// `page_size` query parameters. Pages are numbered from 1.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Pagination {
    page_num: u64,
    page_size: u64,
}

impl Pagination {
    /// Build a pagination request, rejecting empty pages, page zero, pages
    /// larger than `max_page_size`, and pages starting past `i64::MAX` items.
    pub fn new(page_num: u64, page_size: u64, max_page_size: u64) -> Option<Self> {
        if page_num == 0 || page_size == 0 || page_size > max_page_size {
            return None;
        }
        let skip = (page_num - 1).checked_mul(page_size)?;
        if skip > i64::MAX as u64 {
            return None;
        }
        Some(Self {
            page_num,
            page_size,
        })
    }

    pub fn page_num(&self) -> u64 {
        self.page_num
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// How many items precede this page. Never exceeds `i64::MAX`.
    pub fn skip(&self) -> u64 {
        (self.page_num - 1) * self.page_size
    }

    /// Wrap a page of results.
    pub fn paginate<T>(self, items: Vec<T>, total: u64) -> Paginated<T> {
        Paginated {
            items,
            pagination: PaginationResult {
                page_num: self.page_num,
                page_size: self.page_size,
                total,
            },
        }
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Pagination {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let max_page_size = match req.rocket().state::<Config>() {
            Some(config) => config.max_page_size(),
            None => return request::Outcome::Failure((Status::InternalServerError, ())),
        };
        let page_num = match req.query_value::<u64>("page_num").unwrap_or(Ok(1)) {
            Ok(page_num) => page_num,
            Err(_) => return request::Outcome::Failure((Status::BadRequest, ())),
        };
        let page_size = match req
            .query_value::<u64>("page_size")
            .unwrap_or(Ok(DEFAULT_PAGE_SIZE.min(max_page_size)))
        {
            Ok(page_size) => page_size,
            Err(_) => return request::Outcome::Failure((Status::BadRequest, ())),
        };
        match Self::new(page_num, page_size, max_page_size) {
            Some(pagination) => request::Outcome::Success(pagination),
            None => request::Outcome::Failure((Status::BadRequest, ())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationResult {
    pub page_num: u64,
    pub page_size: u64,
    pub total: u64,
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub pagination: PaginationResult,
}
