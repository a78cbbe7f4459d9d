use http_client::Request;

/// User agent sent with every upstream request
const USER_AGENT: &str = concat!("album-expander/", env!("CARGO_PKG_VERSION"));

/// Add headers shared by every catalog request
pub fn add_common_headers(request: &mut Request) {
    let _ = request.insert_header("User-Agent", USER_AGENT);
    let _ = request.insert_header("Accept", "application/json");
    let _ = request.insert_header("Accept-Language", "en-US,en;q=0.9");
}

/// Add headers for an authenticated REST call
pub fn add_api_headers(request: &mut Request, access_token: &str) {
    add_common_headers(request);
    let authorization = format!("Bearer {access_token}");
    let _ = request.insert_header("Authorization", &authorization);
}

/// Add headers for the form-encoded token exchange
pub fn add_token_headers(request: &mut Request) {
    add_common_headers(request);
    let _ = request.insert_header("Content-Type", "application/x-www-form-urlencoded");
}
