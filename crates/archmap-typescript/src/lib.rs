use anyhow::{bail, Context, Result};
use tree_sitter::{Language, Node, Parser, Query, QueryCursor, StreamingIterator};

use archmap_core::analyzer::{push_unique, Extraction, SyntaxExtractor};
use archmap_core::types::SourceRecord;

/// Holds queries compiled for a specific TypeScript dialect.
struct QuerySet {
    import_query: Query,
    export_query: Query,
    class_query: Query,
    function_query: Query,
}

const IMPORT_QUERY_SRC: &str = r#"
(import_statement
  source: (string) @path)

(export_statement
  source: (string) @path)

(call_expression
  function: (identifier) @callee
  arguments: (arguments (string) @path)
  (#eq? @callee "require"))
"#;

const EXPORT_QUERY_SRC: &str = r#"
(export_statement
  declaration: (class_declaration name: (type_identifier) @name))

(export_statement
  declaration: (abstract_class_declaration name: (type_identifier) @name))

(export_statement
  declaration: (function_declaration name: (identifier) @name))

(export_statement
  declaration: (lexical_declaration (variable_declarator name: (identifier) @name)))

(export_statement
  declaration: (interface_declaration name: (type_identifier) @name))

(export_statement
  declaration: (type_alias_declaration name: (type_identifier) @name))

(export_statement
  declaration: (enum_declaration name: (identifier) @name))

(export_statement
  value: (identifier) @name)

(export_statement
  (export_clause (export_specifier name: (identifier) @name)))
"#;

const CLASS_QUERY_SRC: &str = r#"
(class_declaration
  name: (type_identifier) @name)

(abstract_class_declaration
  name: (type_identifier) @name)
"#;

const FUNCTION_QUERY_SRC: &str = r#"
(function_declaration
  name: (identifier) @name)

(generator_function_declaration
  name: (identifier) @name)

(variable_declarator
  name: (identifier) @name
  value: [(arrow_function) (function_expression)])
"#;

fn compile_queries(language: &Language) -> Result<QuerySet> {
    Ok(QuerySet {
        import_query: Query::new(language, IMPORT_QUERY_SRC)
            .context("failed to compile import query")?,
        export_query: Query::new(language, EXPORT_QUERY_SRC)
            .context("failed to compile export query")?,
        class_query: Query::new(language, CLASS_QUERY_SRC)
            .context("failed to compile class query")?,
        function_query: Query::new(language, FUNCTION_QUERY_SRC)
            .context("failed to compile function query")?,
    })
}

/// Syntax-aware extraction for TypeScript and JavaScript files.
///
/// `.tsx`, `.jsx` and plain JavaScript are parsed with the TSX grammar so
/// JSX bodies do not produce error nodes. Files that still fail to parse
/// cleanly are rejected, which sends them back to the heuristic pass.
pub struct TypeScriptExtractor {
    ts_language: Language,
    tsx_language: Language,
    ts_queries: QuerySet,
    tsx_queries: QuerySet,
}

impl TypeScriptExtractor {
    pub fn new() -> Result<Self> {
        let ts_language: Language = tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into();
        let tsx_language: Language = tree_sitter_typescript::LANGUAGE_TSX.into();

        let ts_queries = compile_queries(&ts_language)?;
        let tsx_queries = compile_queries(&tsx_language)?;

        Ok(Self {
            ts_language,
            tsx_language,
            ts_queries,
            tsx_queries,
        })
    }

    fn uses_tsx(record: &SourceRecord) -> bool {
        matches!(
            record.extension.as_str(),
            "tsx" | "jsx" | "js" | "mjs" | "cjs"
        )
    }

    fn language_for(&self, record: &SourceRecord) -> &Language {
        if Self::uses_tsx(record) {
            &self.tsx_language
        } else {
            &self.ts_language
        }
    }

    fn queries_for(&self, record: &SourceRecord) -> &QuerySet {
        if Self::uses_tsx(record) {
            &self.tsx_queries
        } else {
            &self.ts_queries
        }
    }
}

impl SyntaxExtractor for TypeScriptExtractor {
    fn name(&self) -> &'static str {
        "typescript"
    }

    fn supports(&self, record: &SourceRecord) -> bool {
        // Declaration files carry no runtime structure worth a parse.
        if record.path.ends_with(".d.ts") {
            return false;
        }
        matches!(
            record.extension.as_str(),
            "ts" | "tsx" | "mts" | "cts" | "js" | "jsx" | "mjs" | "cjs"
        )
    }

    fn extract(&self, record: &SourceRecord) -> Result<Extraction> {
        let content = record.text();
        let mut parser = Parser::new();
        parser
            .set_language(self.language_for(record))
            .context("failed to set TypeScript language")?;
        let tree = parser
            .parse(&content, None)
            .context("failed to parse TypeScript file")?;
        let root = tree.root_node();
        if root.has_error() {
            bail!("syntax errors in {}", record.path);
        }

        let queries = self.queries_for(record);
        Ok(Extraction {
            imports: collect_captures(&queries.import_query, "path", root, &content),
            exports: collect_captures(&queries.export_query, "name", root, &content),
            classes: collect_captures(&queries.class_query, "name", root, &content),
            functions: collect_captures(&queries.function_query, "name", root, &content),
        })
    }
}

/// Text of every `capture_name` capture in source order, quotes stripped, first occurrence kept.
fn collect_captures(query: &Query, capture_name: &str, root: Node, content: &str) -> Vec<String> {
    let Some(capture_idx) = query.capture_names().iter().position(|n| *n == capture_name) else {
        return Vec::new();
    };

    let mut found: Vec<(usize, String)> = Vec::new();
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(query, root, content.as_bytes());
    while let Some(m) = matches.next() {
        for capture in m.captures {
            if capture.index as usize == capture_idx {
                found.push((capture.node.start_byte(), node_text(capture.node, content)));
            }
        }
    }
    found.sort_by_key(|(start, _)| *start);

    let mut values = Vec::new();
    for (_, text) in &found {
        push_unique(&mut values, text.trim_matches(['"', '\'', '`']));
    }
    values
}

/// Extract text from a tree-sitter node.
fn node_text(node: Node, source: &str) -> String {
    source[node.byte_range()].to_string()
}
