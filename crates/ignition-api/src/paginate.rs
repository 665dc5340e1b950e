// ── Page-by-offset pagination ──
//
// List endpoints return `{"items": [...]}` (or a bare array) with no cursor
// and no reliable total. The walk asks for one page at a time and stops at
// the first page that is not exactly full: short, empty, or oversized (the
// gateway ignored the size parameter). A page whose body repeats the previous
// one means the position was ignored; the walk stops without yielding it.
// Each call to `paginate` starts a fresh walk; nothing is cached between
// walks.

use bytes::Bytes;
use futures_util::{Stream, TryStreamExt};
use reqwest::Method;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::client::{ApiRequest, ApiResponse, GatewayClient};
use crate::error::Error;

/// Default page size for list walks.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// List envelope returned by gateway list endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct PageEnvelope<T> {
    pub items: Vec<T>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PageBody<T> {
    Envelope(PageEnvelope<T>),
    Bare(Vec<T>),
}

impl<T: DeserializeOwned> PageBody<T> {
    fn into_items(self) -> Vec<T> {
        match self {
            Self::Envelope(env) => env.items,
            Self::Bare(items) => items,
        }
    }
}

/// Decode a list body that is either an envelope or a bare array.
pub(crate) fn decode_items<T: DeserializeOwned>(response: &ApiResponse) -> Result<Vec<T>, Error> {
    response.json::<PageBody<T>>().map(PageBody::into_items)
}

/// Decode a non-paginated list body: a bare array, an `items` envelope, or
/// an object holding the list under `key`. Anything else is an empty list.
pub(crate) fn decode_listing<T: DeserializeOwned>(
    response: &ApiResponse,
    key: &str,
) -> Result<Vec<T>, Error> {
    let value: Value = response.json()?;
    let list = match value {
        Value::Array(_) => value,
        Value::Object(mut map) => map
            .remove("items")
            .or_else(|| map.remove(key))
            .unwrap_or(Value::Array(Vec::new())),
        _ => Value::Array(Vec::new()),
    };
    serde_json::from_value(list)
        .map_err(|e| Error::general(format!("unexpected {key} list: {e}")))
}

/// How a page position is sent to the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageCursor {
    /// Number of items already received (`offset=0, 100, 200, ...`).
    Offset,
    /// Page number, counting from `first` (`page=0, 1, 2, ...` or `1, 2, ...`).
    Index { first: u64 },
}

/// Parameters of one pagination walk.
#[derive(Debug, Clone)]
pub struct PageRequest {
    pub url: Url,
    pub page_param: String,
    pub size_param: String,
    pub page_size: usize,
    pub cursor: PageCursor,
    /// Extra query parameters sent with every page.
    pub query: Vec<(String, String)>,
}

impl PageRequest {
    /// `offset` / `limit` walk.
    pub fn offset(url: Url, page_size: usize) -> Self {
        Self {
            url,
            page_param: "offset".into(),
            size_param: "limit".into(),
            page_size,
            cursor: PageCursor::Offset,
            query: Vec::new(),
        }
    }

    /// Page-number walk starting at `first`, sending `page_param`.
    pub fn indexed(url: Url, page_param: impl Into<String>, first: u64, page_size: usize) -> Self {
        Self {
            url,
            page_param: page_param.into(),
            size_param: "limit".into(),
            page_size,
            cursor: PageCursor::Index { first },
            query: Vec::new(),
        }
    }

    pub fn size_param(mut self, name: impl Into<String>) -> Self {
        self.size_param = name.into();
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    fn page(&self, page_no: u64, seen: u64) -> ApiRequest {
        let position = match self.cursor {
            PageCursor::Offset => seen,
            PageCursor::Index { first } => first + page_no,
        };
        ApiRequest::new(Method::GET, self.url.clone())
            .query_pairs(self.query.iter().cloned())
            .query(self.page_param.clone(), position)
            .query(self.size_param.clone(), self.page_size)
    }
}

impl GatewayClient {
    /// Lazily walk a paginated list endpoint.
    ///
    /// Items come out in server order. A failing page ends the sequence with
    /// that page's error; items already yielded stay yielded.
    pub fn paginate<T>(&self, request: PageRequest) -> impl Stream<Item = Result<T, Error>> + '_
    where
        T: DeserializeOwned + 'static,
    {
        async_stream::try_stream! {
            if request.page_size == 0 {
                Err::<(), _>(Error::config("page size must be at least 1"))?;
            }

            let mut page_no: u64 = 0;
            let mut seen: u64 = 0;
            let mut previous: Option<Bytes> = None;
            loop {
                let response = self.execute(request.page(page_no, seen)).await?;
                if previous.as_ref() == Some(&response.body) {
                    debug!(url = %request.url, page = page_no, "page repeated, paging ignored");
                    break;
                }
                let items: Vec<T> = decode_items(&response)?;
                let received = items.len();
                trace!(url = %request.url, page = page_no, received, "received page");

                for item in items {
                    yield item;
                }

                if received != request.page_size {
                    if received > request.page_size {
                        debug!(url = %request.url, received, "oversized page, paging ignored");
                    }
                    break;
                }
                page_no += 1;
                seen += u64::try_from(received).unwrap_or(u64::MAX);
                previous = Some(response.body);
            }
        }
    }

    /// Drain a pagination walk into a `Vec`.
    pub async fn collect_all<T>(&self, request: PageRequest) -> Result<Vec<T>, Error>
    where
        T: DeserializeOwned + 'static,
    {
        self.paginate(request).try_collect().await
    }
}
