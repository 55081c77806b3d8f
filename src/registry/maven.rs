use anyhow::Result;
use reqwest::Client;
use serde::Deserialize;

const SEARCH_URL: &str = "https://search.maven.org/solrsearch/select";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    response: SearchBody,
}

#[derive(Debug, Default, Deserialize)]
struct SearchBody {
    #[serde(default, rename = "numFound")]
    num_found: usize,
    #[serde(default)]
    docs: Vec<SearchDoc>,
}

#[derive(Debug, Deserialize)]
struct SearchDoc {
    #[serde(default)]
    g: String,
    #[serde(default)]
    a: String,
}

/// One page of search results.
#[derive(Debug, Default, PartialEq)]
pub struct Page {
    /// `group:artifact` for every doc with both parts present.
    pub coordinates: Vec<String>,
    /// Docs on this page, including incomplete ones.
    pub returned: usize,
    pub total: usize,
}

/// Fetch a single page of artifacts whose group starts with `group_prefix`.
pub async fn fetch_page(client: &Client, group_prefix: &str, rows: usize, start: usize) -> Result<Page> {
    let body = client
        .get(SEARCH_URL)
        .query(&[
            ("q", format!("g:{group_prefix}*")),
            ("wt", "json".to_string()),
            ("rows", rows.to_string()),
            ("start", start.to_string()),
        ])
        .header("User-Agent", concat!("dep-categorizr/", env!("CARGO_PKG_VERSION")))
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    parse_page(&body)
}

/// Page through all results until an empty page or `numFound` is reached.
///
/// A failing page ends the walk with a warning; coordinates gathered so far
/// are returned. `on_page` receives the running total after each page.
pub async fn fetch_artifacts(
    client: &Client,
    group_prefix: &str,
    rows: usize,
    mut on_page: impl FnMut(usize),
) -> Vec<String> {
    let rows = rows.max(1);
    let mut coordinates = Vec::new();
    let mut start = 0;

    loop {
        let page = match fetch_page(client, group_prefix, rows, start).await {
            Ok(page) => page,
            Err(err) => {
                tracing::warn!(start, "maven search stopped: {err:#}");
                break;
            }
        };

        if page.returned == 0 {
            break;
        }

        coordinates.extend(page.coordinates);
        start += rows;
        on_page(coordinates.len());

        if start >= page.total {
            break;
        }
    }

    coordinates
}

fn parse_page(body: &str) -> Result<Page> {
    let parsed: SearchResponse = serde_json::from_str(body)?;
    let returned = parsed.response.docs.len();

    let coordinates = parsed
        .response
        .docs
        .into_iter()
        .filter(|d| !d.g.is_empty() && !d.a.is_empty())
        .map(|d| format!("{}:{}", d.g, d.a))
        .collect();

    Ok(Page {
        coordinates,
        returned,
        total: parsed.response.num_found,
    })
}
