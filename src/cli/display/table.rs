//! Table rendering for list output

use super::ColorTheme;
use crate::domain::reference::PrefixTable;
use chrono::{DateTime, Utc};
use comfy_table::{presets::NOTHING, Cell, CellAlignment, ContentArrangement, Table};
use kube::{Resource, ResourceExt};

pub const NAMESPACE_HEADER: &str = "NAMESPACE";
pub const READY_HEADER: &str = "READY";

/// Values shared by every row of one listing.
#[derive(Debug, Clone)]
pub struct PrintContext {
    pub namespace: String,
    pub prefixes: PrefixTable,
    pub now: DateTime<Utc>,
    pub all_namespaces: bool,
    pub no_headers: bool,
    pub color: bool,
}

impl PrintContext {
    pub fn new(namespace: &str, prefixes: PrefixTable) -> Self {
        Self {
            namespace: namespace.to_string(),
            prefixes,
            now: Utc::now(),
            all_namespaces: false,
            no_headers: false,
            color: false,
        }
    }
}

/// Column set of one resource kind in list output.
pub trait Printable: Resource {
    /// Headers without the namespace column
    const HEADERS: &'static [&'static str];

    fn row(&self, ctx: &PrintContext) -> Vec<String>;
}

/// Order items for listing: by name, or across namespaces with `default`
/// first in input order followed by the rest by namespace then name.
pub fn sort_for_listing<K: Resource>(items: &mut Vec<K>, all_namespaces: bool) {
    if !all_namespaces {
        items.sort_by_key(|item| item.name_any());
        return;
    }
    let (mut ordered, mut rest): (Vec<K>, Vec<K>) = std::mem::take(items)
        .into_iter()
        .partition(|item| item.namespace().as_deref() == Some("default"));
    rest.sort_by(|a, b| {
        (a.namespace(), a.name_any()).cmp(&(b.namespace(), b.name_any()))
    });
    ordered.extend(rest);
    *items = ordered;
}

/// Table renderer for formatted output
pub struct TableRenderer {
    theme: ColorTheme,
}

impl Default for TableRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TableRenderer {
    pub fn new() -> Self {
        Self {
            theme: ColorTheme::default(),
        }
    }

    /// Render already sorted items.
    pub fn render<K: Printable>(&self, items: &[K], ctx: &PrintContext) -> String {
        let mut headers: Vec<&str> = Vec::with_capacity(K::HEADERS.len() + 1);
        if ctx.all_namespaces {
            headers.push(NAMESPACE_HEADER);
        }
        headers.extend_from_slice(K::HEADERS);

        let rows = items
            .iter()
            .map(|item| {
                let mut row = Vec::with_capacity(headers.len());
                if ctx.all_namespaces {
                    row.push(item.namespace().unwrap_or_default());
                }
                row.extend(item.row(ctx));
                row
            })
            .collect::<Vec<_>>();
        self.render_rows(&headers, rows, ctx)
    }

    /// Render free-form rows, coloring the `READY` column when enabled.
    pub fn render_rows(
        &self,
        headers: &[&str],
        rows: Vec<Vec<String>>,
        ctx: &PrintContext,
    ) -> String {
        let ready_column = headers.iter().position(|h| *h == READY_HEADER);

        let mut table = Table::new();
        table
            .load_preset(NOTHING)
            .set_content_arrangement(ContentArrangement::Disabled);
        if !ctx.color {
            table.force_no_tty();
        }
        if !ctx.no_headers {
            table.set_header(
                headers
                    .iter()
                    .map(|h| Cell::new(h).set_alignment(CellAlignment::Left))
                    .collect::<Vec<_>>(),
            );
        }
        for row in rows {
            let cells = row
                .into_iter()
                .enumerate()
                .map(|(i, value)| {
                    let cell = Cell::new(&value);
                    match ready_column {
                        Some(col) if col == i && ctx.color => {
                            cell.fg(self.theme.status_color(&value))
                        }
                        _ => cell,
                    }
                })
                .collect::<Vec<_>>();
            table.add_row(cells);
        }
        for column in table.column_iter_mut() {
            column.set_padding((0, 2));
        }

        let mut output = table
            .lines()
            .map(|line| line.trim_end().to_string())
            .collect::<Vec<_>>()
            .join("\n");
        output.push('\n');
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::kubernetes::resources::{Channel, ChannelSpec};

    fn channel(ns: &str, name: &str) -> Channel {
        let mut ch = Channel::new(name, ChannelSpec::default());
        ch.metadata.namespace = Some(ns.to_string());
        ch
    }

    fn names(items: &[Channel]) -> Vec<String> {
        items
            .iter()
            .map(|c| format!("{}/{}", c.namespace().unwrap_or_default(), c.name_any()))
            .collect()
    }

    #[test]
    fn test_single_namespace_sorted_by_name() {
        let mut items = vec![channel("a", "zeta"), channel("a", "alpha"), channel("a", "mid")];
        sort_for_listing(&mut items, false);
        assert_eq!(names(&items), vec!["a/alpha", "a/mid", "a/zeta"]);
    }

    #[test]
    fn test_all_namespaces_default_first_in_input_order() {
        let mut items = vec![
            channel("zoo", "b"),
            channel("default", "y"),
            channel("apps", "z"),
            channel("default", "x"),
            channel("apps", "a"),
        ];
        sort_for_listing(&mut items, true);
        assert_eq!(
            names(&items),
            vec!["default/y", "default/x", "apps/a", "apps/z", "zoo/b"]
        );
    }

    #[test]
    fn test_render_rows_headers_and_namespace_column() {
        let mut ctx = PrintContext::new("test", PrefixTable::with_defaults());
        let out = TableRenderer::new().render_rows(
            &["NAME", "READY"],
            vec![vec!["pipe".to_string(), "True".to_string()]],
            &ctx,
        );
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].starts_with("NAME"));
        assert!(lines[1].starts_with("pipe"));
        assert!(lines[1].ends_with("True"));

        ctx.no_headers = true;
        let out = TableRenderer::new().render_rows(
            &["NAME"],
            vec![vec!["pipe".to_string()]],
            &ctx,
        );
        assert_eq!(out.trim(), "pipe");
    }
}
