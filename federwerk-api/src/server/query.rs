use federwerk_db::page::PageRequest;
use serde::Deserialize;

/// The `?page=` query parameter, parsed leniently: anything that is not a
/// number falls back to the first page, numbers below 1 resolve to the last
/// page, and numbers beyond the last page are clamped by the query layer.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
pub struct PageQuery {
    page: Option<String>,
}

impl PageQuery {
    #[must_use]
    pub fn request(&self) -> PageRequest {
        let Some(raw) = self.page.as_deref() else {
            return PageRequest::FIRST;
        };

        match raw.trim().parse::<i64>() {
            Err(_) => PageRequest::FIRST,
            Ok(number) if number < 1 => PageRequest::Last,
            Ok(number) => u32::try_from(number).map_or(PageRequest::Last, PageRequest::Number),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::server::query::PageQuery;
    use federwerk_db::page::PageRequest;

    fn query(page: Option<&str>) -> PageQuery {
        PageQuery {
            page: page.map(str::to_owned),
        }
    }

    #[test]
    fn missing_and_garbage_default_to_first() {
        assert_eq!(query(None).request(), PageRequest::FIRST);
        assert_eq!(query(Some("")).request(), PageRequest::FIRST);
        assert_eq!(query(Some("two")).request(), PageRequest::FIRST);
        assert_eq!(query(Some("2.5")).request(), PageRequest::FIRST);
    }

    #[test]
    fn numbers_pass_through() {
        assert_eq!(query(Some("1")).request(), PageRequest::Number(1));
        assert_eq!(query(Some("17")).request(), PageRequest::Number(17));
        assert_eq!(query(Some(" 3 ")).request(), PageRequest::Number(3));
    }

    #[test]
    fn below_range_resolves_to_last() {
        assert_eq!(query(Some("0")).request(), PageRequest::Last);
        assert_eq!(query(Some("-4")).request(), PageRequest::Last);
    }
}
