//! `scraper`-backed element selection.

use digester_core::{
    application::{ApplicationError, ports::HtmlSelector},
    domain::{HtmlQuery, HtmlSelection},
    error::DigesterResult,
};
use scraper::{ElementRef, Selector};
use tracing::{instrument, trace};

use super::document::{detach, reparse, scope};
use super::xpath;

/// Selects elements by id, CSS selector or XPath subset.
///
/// XPath expressions are translated to CSS first (see [`xpath::to_css`]).
#[derive(Debug, Default, Clone, Copy)]
pub struct ScraperSelector;

impl ScraperSelector {
    pub fn new() -> Self {
        Self
    }

    fn compile(&self, query: &HtmlQuery) -> DigesterResult<Selector> {
        let failed = |reason: String| ApplicationError::SelectorFailed {
            selector: query.to_string(),
            reason,
        };

        let css = match query {
            HtmlQuery::Id(_) => "[id]".to_string(),
            HtmlQuery::Css(css) => css.clone(),
            HtmlQuery::XPath(expr) => xpath::to_css(expr).map_err(failed)?,
        };
        Selector::parse(&css).map_err(|e| failed(e.to_string()).into())
    }
}

impl HtmlSelector for ScraperSelector {
    #[instrument(skip_all, level = "trace", fields(query = %query))]
    fn select(&self, root: &HtmlSelection, query: &HtmlQuery) -> DigesterResult<HtmlSelection> {
        let selector = self.compile(query)?;
        let mut found = Vec::new();

        for element in root.elements() {
            let tree = reparse(element);
            let within = scope(&tree, element);
            let mut matches = std::iter::once(within)
                .filter(|e| selector.matches(e))
                .chain(within.select(&selector));

            match query {
                HtmlQuery::Id(id) => {
                    let hit = matches.find(|e: &ElementRef<'_>| e.value().id() == Some(id.as_str()));
                    if let Some(hit) = hit {
                        found.push(detach(hit));
                        break;
                    }
                }
                _ => found.extend(matches.map(detach)),
            }
        }

        trace!(count = found.len(), "elements selected");
        Ok(HtmlSelection::new(found))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::parse_document;
    use digester_core::error::DigesterError;

    const PAGE: &str = r#"
        <html><body>
          <p id="fname">Bruno</p>
          <div class="address main">
            <span class="street">Castro St</span>
            <span class="city">San Francisco</span>
          </div>
          <ul><li>a</li><li>b</li><li>c</li></ul>
        </body></html>
    "#;

    fn select(query: HtmlQuery) -> DigesterResult<HtmlSelection> {
        ScraperSelector::new().select(&parse_document(PAGE), &query)
    }

    #[test]
    fn by_id() {
        let selection = select(HtmlQuery::Id("fname".into())).unwrap();
        assert_eq!(selection.len(), 1);
        assert_eq!(selection.text(), "Bruno");
        assert_eq!(selection.first().unwrap().tag, "p");

        assert!(select(HtmlQuery::Id("missing".into())).unwrap().is_empty());
    }

    #[test]
    fn by_css() {
        let selection = select(HtmlQuery::Css("div.address span".into())).unwrap();
        assert_eq!(selection.len(), 2);
        assert_eq!(selection.text(), "Castro St San Francisco");
    }

    #[test]
    fn by_xpath() {
        let selection = select(HtmlQuery::XPath("//ul/li[2]".into())).unwrap();
        assert_eq!(selection.text(), "b");

        let selection =
            select(HtmlQuery::XPath("//div[contains(@class,'address')]/span[@class='city']".into()))
                .unwrap();
        assert_eq!(selection.text(), "San Francisco");

        let selection = select(HtmlQuery::XPath("//div/*[2]".into())).unwrap();
        assert_eq!(selection.text(), "San Francisco");
    }

    #[test]
    fn nested_selection_queries_below_each_element() {
        let address = select(HtmlQuery::Css("div.address".into())).unwrap();
        let street = ScraperSelector::new()
            .select(&address, &HtmlQuery::Css("span.street".into()))
            .unwrap();
        assert_eq!(street.text(), "Castro St");
    }

    #[test]
    fn nested_selection_below_table_rows() {
        let page = parse_document(
            r#"<table>
                 <tr class="row"><td class="city">Joinville</td></tr>
                 <tr class="row"><td class="city">Atlanta</td></tr>
               </table>"#,
        );
        let selector = ScraperSelector::new();

        let rows = selector.select(&page, &HtmlQuery::Css("tr.row".into())).unwrap();
        assert_eq!(rows.len(), 2);

        let cells = selector.select(&rows, &HtmlQuery::Css("td.city".into())).unwrap();
        assert_eq!(cells.len(), 2);
        assert_eq!(cells.text(), "Joinville Atlanta");

        let cell = selector
            .select(&cells, &HtmlQuery::XPath("//td[@class='city']".into()))
            .unwrap();
        assert_eq!(cell.len(), 2);
    }

    #[test]
    fn wrapper_elements_are_not_selected() {
        let page = parse_document(r#"<table><tr><td>x</td></tr></table>"#);
        let selector = ScraperSelector::new();

        let cells = selector.select(&page, &HtmlQuery::Css("td".into())).unwrap();
        let rows = selector.select(&cells, &HtmlQuery::Css("tr, table".into())).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn invalid_selectors_fail() {
        assert!(matches!(
            select(HtmlQuery::Css("div[".into())),
            Err(DigesterError::Application(ApplicationError::SelectorFailed { .. }))
        ));
        assert!(matches!(
            select(HtmlQuery::XPath("//p/text()".into())),
            Err(DigesterError::Application(ApplicationError::SelectorFailed { .. }))
        ));
    }
}
