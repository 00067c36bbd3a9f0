/// Outcome of loading a resource and checking the caller's right to mutate it.
///
/// `NotFound` and `Forbidden` are deliberately distinct so handlers can answer
/// 404 and 403 without conflating the two.
#[derive(Debug)]
pub enum Access<T> {
    Granted(T),
    NotFound,
    Forbidden,
}
