//! Route table shared by the server router and the HTTP client

pub const WORKOUTS: &str = "/api/workouts";
pub const WORKOUT: &str = "/api/workouts/:id";

/// Substitute `:name` segments in `path` with the matching parameter
pub fn build_url(path: &str, params: &[(&str, &str)]) -> String {
  let mut url = path.to_string();
  for (key, value) in params {
    let placeholder = format!(":{}", key);
    if url.contains(&placeholder) {
      url = url.replace(&placeholder, value);
    }
  }
  url
}
