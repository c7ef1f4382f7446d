pub mod entries;
pub mod fix;
pub mod reports;

pub async fn health() -> &'static str {
    "ok"
}
