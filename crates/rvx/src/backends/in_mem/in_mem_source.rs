use std::collections::VecDeque;

use anyhow::Result;
use async_trait::async_trait;

use crate::backends::Source;

/// 📦 The world's most predictable line source.
///
/// You hand it lines, it hands them back, in order, once. Then `None` forever,
/// like the snack cabinet after midnight.
#[derive(Debug, Default)]
pub(crate) struct InMemorySource {
    lines: VecDeque<String>,
}

impl InMemorySource {
    pub(crate) fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl Source for InMemorySource {
    async fn next_line(&mut self) -> Result<Option<String>> {
        Ok(self.lines.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn the_one_where_lines_come_back_in_order_then_never_again() {
        let mut source = InMemorySource::new(["header", "one", "two"]);
        assert_eq!(source.next_line().await.unwrap().as_deref(), Some("header"));
        assert_eq!(source.next_line().await.unwrap().as_deref(), Some("one"));
        assert_eq!(source.next_line().await.unwrap().as_deref(), Some("two"));
        assert_eq!(source.next_line().await.unwrap(), None);
        assert_eq!(source.next_line().await.unwrap(), None);
    }
}
