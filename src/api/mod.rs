use rocket::Route;

mod items;

pub fn routes() -> Vec<Route> {
    items::routes()
}
