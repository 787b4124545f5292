//! Streaming over every hit of a query.

use std::fmt::Display;

use futures::stream::{self, Stream, TryStreamExt};

use search_odm_shared::{PageCursor, Query, SearchHit};

use crate::errors::OdmError;
use crate::interfaces::Serializer;
use crate::mapping::Entity;
use crate::repository::DocumentRepository;

enum StreamState {
    Start(Query),
    Next(Query, PageCursor),
    Done,
}

impl<T: Entity, ID: Display, S: Serializer + Clone> DocumentRepository<T, ID, S> {
    /// Stream every hit of a query, page by page.
    ///
    /// Pages are walked with a scroll when the query sets a scroll time, and
    /// with `search_after` otherwise; the latter needs a sorted query. Pages
    /// are requested lazily as the stream is polled. The stream ends after
    /// the first page without a cursor and cannot be restarted; a query with
    /// `max_results` is a single page.
    pub fn search_stream(
        &self,
        query: Query,
    ) -> impl Stream<Item = Result<SearchHit<T>, OdmError>> + '_ {
        stream::try_unfold(StreamState::Start(query), move |state| async move {
            let (query, mut page) = match state {
                StreamState::Start(query) => {
                    if !query.has_scroll_time() && !query.sort.is_sorted() {
                        return Err(OdmError::invalid_query(
                            "streaming without a scroll requires a sorted query",
                        ));
                    }
                    let page = self.search(&query).await?;
                    (query, page)
                }
                StreamState::Next(query, cursor) => {
                    let page = self.next_page(&query, cursor).await?;
                    (query, page)
                }
                StreamState::Done => return Ok(None),
            };

            let next = match page.take_cursor() {
                Some(cursor) => StreamState::Next(query, cursor),
                None => StreamState::Done,
            };
            let hits = stream::iter(page.into_iter().map(Ok::<_, OdmError>));
            Ok(Some((hits, next)))
        })
        .try_flatten()
    }
}
