pub mod dates;
pub mod extract;
pub mod tables;

use scraper::Html;

/// Parse a fetched body. html5ever recovers from any markup, so this
/// never fails.
pub fn parse_document(body: &str) -> Html {
    Html::parse_document(body)
}
