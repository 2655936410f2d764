use std::sync::OnceLock;

use super::JsonTransport;
use crate::assemble::{attach_tags, enrich_with_history};
use crate::batch::BatchWindow;
use crate::constants::columns::{ID, TAGS};
use crate::errors::PipelineError;
use crate::mapping::ResponseSchema;
use crate::normalize::normalize_tags;
use crate::table::Table;

const VIDEO_PARTS: &str = "snippet,contentDetails,statistics";
const CATEGORY_PARTS: &str = "snippet";

/// `/videos` response → video detail table.
pub fn video_schema() -> &'static ResponseSchema {
    static SCHEMA: OnceLock<ResponseSchema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        ResponseSchema::new(
            "items",
            &[
                ("id", "id"),
                ("snippet.title", "videoTitle"),
                ("snippet.channelTitle", "channelTitle"),
                ("snippet.categoryId", "categoryId"),
                ("snippet.tags", "tags"),
                ("snippet.description", "description"),
                ("contentDetails.duration", "duration"),
                ("snippet.publishedAt", "publishDate"),
                ("statistics.viewCount", "viewCount"),
                ("snippet.channelId", "channelId"),
                ("snippet.liveBroadcastContent", "liveContent"),
            ],
        )
    })
}

/// `/videoCategories` response → category table.
pub fn category_schema() -> &'static ResponseSchema {
    static SCHEMA: OnceLock<ResponseSchema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        ResponseSchema::new(
            "items",
            &[("id", "categoryId"), ("snippet.title", "categoryTitle")],
        )
    })
}

/// YouTube Data API lookups over an injected transport.
pub struct YouTubeClient<T: JsonTransport> {
    transport: T,
}

impl<T: JsonTransport> YouTubeClient<T> {
    /// Wrap `transport`.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Raw detail rows for up to 50 comma-joined video ids.
    pub fn video_details(&self, joined: &str) -> Result<Table, PipelineError> {
        let body = self
            .transport
            .get_json("videos", &[("part", VIDEO_PARTS), ("id", joined)])?;
        video_schema().extract(&body)
    }

    /// Category rows for up to 50 comma-joined category ids.
    pub fn video_categories(&self, joined: &str) -> Result<Table, PipelineError> {
        let body = self
            .transport
            .get_json("videoCategories", &[("part", CATEGORY_PARTS), ("id", joined)])?;
        category_schema().extract(&body)
    }

    /// One batch window of the video table: details with tags rendered per
    /// video and the matching history rows attached when possible.
    pub fn video_details_window(
        &self,
        joined: &str,
        window: BatchWindow,
        history: &Table,
    ) -> Result<Table, PipelineError> {
        let details = self.video_details(joined)?;
        let (details, tags) = normalize_tags(details, ID, TAGS)?;
        let tagged = attach_tags(&details, &tags)?;
        Ok(enrich_with_history(tagged, history, window).into_table_logged(window))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::fake::FakeTransport;
    use crate::types::Platform;
    use serde_json::{Value, json};

    fn video(id: &str, category: &str, tags: Option<Vec<&str>>) -> Value {
        let mut snippet = json!({
            "title": format!("title {id}"),
            "channelTitle": "channel",
            "categoryId": category,
            "description": "",
            "publishedAt": "2021-01-01T00:00:00Z",
            "channelId": "UC1",
            "liveBroadcastContent": "none",
        });
        if let Some(tags) = tags {
            snippet["tags"] = json!(tags);
        }
        json!({
            "id": id,
            "snippet": snippet,
            "contentDetails": {"duration": "PT3M"},
            "statistics": {"viewCount": "42"},
        })
    }

    #[test]
    fn video_details_requests_all_parts_and_flattens() {
        let transport = FakeTransport::new(
            Platform::YouTube,
            vec![json!({"items": [video("a", "10", Some(vec!["x"]))]})],
        );
        let client = YouTubeClient::new(&transport);

        let table = client.video_details("a").unwrap();

        assert_eq!(table.columns().count(), 11);
        assert_eq!(table.value(0, "videoTitle"), Some(&json!("title a")));
        assert_eq!(table.value(0, "duration"), Some(&json!("PT3M")));
        assert_eq!(table.value(0, "viewCount"), Some(&json!("42")));
        let requests = transport.requests.borrow();
        assert_eq!(requests[0].0, "videos");
        assert_eq!(transport.query_values("part"), vec![VIDEO_PARTS.to_string()]);
    }

    #[test]
    fn categories_map_id_and_title() {
        let transport = FakeTransport::new(
            Platform::YouTube,
            vec![json!({"items": [{"id": "10", "snippet": {"title": "Music"}}]})],
        );
        let table = YouTubeClient::new(&transport).video_categories("10").unwrap();
        assert_eq!(
            table.columns().collect::<Vec<_>>(),
            vec!["categoryId", "categoryTitle"]
        );
        assert_eq!(table.value(0, "categoryTitle"), Some(&json!("Music")));
        assert_eq!(transport.query_values("id"), vec!["10".to_string()]);
    }

    #[test]
    fn details_window_renders_tags_and_attaches_history() {
        let transport = FakeTransport::new(
            Platform::YouTube,
            vec![json!({"items": [
                video("a", "10", Some(vec!["x", "y"])),
                video("b", "20", None),
            ]})],
        );
        let history = Table::from_rows(
            ["timestamp", "id"],
            vec![
                vec![json!("2021-03-01T10:00:00Z"), json!("a")],
                vec![json!("2021-03-01T11:00:00Z"), json!("b")],
            ],
        )
        .unwrap();

        let table = YouTubeClient::new(&transport)
            .video_details_window("a,b", BatchWindow { start: 0, end: 2 }, &history)
            .unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.value(0, "tags"), Some(&json!("x,y")));
        assert_eq!(table.value(1, "tags"), Some(&Value::Null));
        assert_eq!(table.value(1, "timestamp"), Some(&json!("2021-03-01T11:00:00Z")));
    }

    #[test]
    fn details_window_without_history_keeps_rows() {
        let transport = FakeTransport::new(
            Platform::YouTube,
            vec![json!({"items": [video("a", "10", None)]})],
        );
        let table = YouTubeClient::new(&transport)
            .video_details_window("a", BatchWindow { start: 5, end: 6 }, &Table::new(["timestamp", "id"]))
            .unwrap();
        assert_eq!(table.len(), 1);
        assert!(!table.has_column("timestamp"));
    }

    #[test]
    fn lookup_failure_propagates() {
        let transport = FakeTransport::new(Platform::YouTube, Vec::new());
        transport.push_error("quota exceeded");
        let err = YouTubeClient::new(&transport).video_details("a").unwrap_err();
        assert!(matches!(err, PipelineError::Lookup { .. }));
    }
}
