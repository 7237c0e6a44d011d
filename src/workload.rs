//! Request-level helpers layered over a [`WorldRepository`].
use crate::error::Result;
use crate::traits::WorldRepository;
use crate::types::Fortune;

pub const MIN_QUERIES: usize = 1;
pub const MAX_QUERIES: usize = 500;

pub const EXTRA_FORTUNE: &str = "Additional fortune added at request time.";

/// Turn a raw `queries` parameter into a record count. Missing input, or anything that is not a 32-bit integer, yields
/// the minimum; integers are clamped to `[MIN_QUERIES, MAX_QUERIES]`.
pub fn clamp_queries(raw: Option<&str>) -> usize {
    match raw.map(str::parse::<i32>) {
        Some(Ok(n)) => n.clamp(MIN_QUERIES as i32, MAX_QUERIES as i32) as usize,
        _ => MIN_QUERIES,
    }
}

/// All stored fortunes plus the request-time one, ordered by message.
pub async fn fortunes_page<R: WorldRepository + ?Sized>(repo: &R) -> Result<Vec<Fortune>> {
    let mut fortunes = repo.fetch_fortunes().await?;
    fortunes.push(Fortune::new(0, EXTRA_FORTUNE));
    fortunes.sort_by(|a, b| a.message.cmp(&b.message));
    Ok(fortunes)
}
