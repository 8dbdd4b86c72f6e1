use std::collections::HashMap;

use regex::Regex;

use crate::analyzer::{push_unique, Extraction};
use crate::types::{LanguageFamily, SourceRecord};

// Shapes tried for every file regardless of language family.

const GENERIC_IMPORTS: &[&str] = &[
    // import x from 'y' / import { a, b } from "y" / import * as x from 'y'
    r#"\bimport\s+(?:type\s+)?[\w*$\s{},]+?\s+from\s+['"]([^'"]+)['"]"#,
    // import './side-effect'
    r#"(?m)^\s*import\s+['"]([^'"]+)['"]"#,
    // export { a } from './y' / export * from './y'
    r#"\bexport\s+(?:type\s+)?(?:\*|\{[^}]*\})(?:\s+as\s+\w+)?\s+from\s+['"]([^'"]+)['"]"#,
    // require('y') / import('y')
    r#"\b(?:require|import)\(\s*['"]([^'"]+)['"]\s*\)"#,
    // from y import z
    r"(?m)^\s*from\s+([\w.]+)\s+import\b",
];

const GENERIC_EXPORTS: &[&str] = &[
    r"(?m)^[ \t]*export\s+(?:default\s+)?(?:declare\s+)?(?:abstract\s+)?(?:async\s+)?(?:class|function\*?|const|let|var|interface|type|enum)\s+([A-Za-z_$][\w$]*)",
];

const GENERIC_CLASSES: &[&str] = &[
    r"(?m)^[ \t]*(?:(?:export|default|declare|public|private|protected|internal|abstract|static|final|sealed|data|open)\s+)*class\s+([A-Za-z_$][\w$]*)",
];

const GENERIC_FUNCTIONS: &[&str] = &[
    r"(?m)^[ \t]*(?:(?:export|default|async|declare)\s+)*function\s*\*?\s*([A-Za-z_$][\w$]*)",
    r"(?m)^[ \t]*(?:export\s+)?(?:const|let|var)\s+([A-Za-z_$][\w$]*)\s*=\s*(?:async\s+)?(?:\([^)]*\)|[A-Za-z_$][\w$]*)\s*=>",
    r"(?m)^[ \t]*(?:async\s+)?def\s+([A-Za-z_]\w*)",
];

/// Compiled regexes for one group of shapes. Every pattern captures the name in group 1.
#[derive(Default)]
struct PatternSet {
    imports: Vec<Regex>,
    exports: Vec<Regex>,
    classes: Vec<Regex>,
    functions: Vec<Regex>,
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|p| match Regex::new(p) {
            Ok(re) => Some(re),
            Err(e) => {
                tracing::warn!("skipping invalid extraction pattern {p:?}: {e}");
                None
            }
        })
        .collect()
}

impl PatternSet {
    fn new(imports: &[&str], exports: &[&str], classes: &[&str], functions: &[&str]) -> Self {
        Self {
            imports: compile(imports),
            exports: compile(exports),
            classes: compile(classes),
            functions: compile(functions),
        }
    }

    fn apply(&self, text: &str, out: &mut Extraction) {
        collect(&self.imports, text, &mut out.imports);
        collect(&self.exports, text, &mut out.exports);
        collect(&self.classes, text, &mut out.classes);
        collect(&self.functions, text, &mut out.functions);
    }
}

fn collect(patterns: &[Regex], text: &str, into: &mut Vec<String>) {
    for re in patterns {
        for caps in re.captures_iter(text) {
            if let Some(m) = caps.get(1) {
                push_unique(into, m.as_str().trim());
            }
        }
    }
}

fn family_patterns(family: LanguageFamily) -> PatternSet {
    match family {
        LanguageFamily::Python => PatternSet::new(
            &[],
            &[
                r"(?m)^(?:async\s+)?def\s+([A-Za-z]\w*)",
                r"(?m)^class\s+([A-Za-z_]\w*)",
            ],
            &[],
            &[],
        ),
        LanguageFamily::JavaScript => PatternSet::new(
            &[],
            &[
                r"(?m)^\s*(?:module\.)?exports\.([A-Za-z_$][\w$]*)\s*=",
                r"(?m)^\s*export\s+default\s+([A-Za-z_$][\w$]*)\s*;?\s*$",
            ],
            &[],
            &[],
        ),
        LanguageFamily::Rust => PatternSet::new(
            &[r"(?m)^[ \t]*(?:pub(?:\([^)]*\))?\s+)?use\s+((?:::)?[\w:]*\w)"],
            &[r"(?m)^[ \t]*pub\s+(?:(?:const|async|unsafe)\s+)*(?:fn|struct|enum|trait|type|const|static|mod)\s+(\w+)"],
            &[r"(?m)^[ \t]*(?:pub(?:\([^)]*\))?\s+)?(?:struct|enum|trait|union)\s+(\w+)"],
            &[r#"(?m)^[ \t]*(?:pub(?:\([^)]*\))?\s+)?(?:(?:const|async|unsafe)\s+)*(?:extern\s+"[^"]*"\s+)?fn\s+(\w+)"#],
        ),
        LanguageFamily::Go => PatternSet::new(
            &[r#"(?m)^\s*import\s+(?:[\w.]+\s+)?"([^"]+)""#],
            &[],
            &[r"(?m)^type\s+(\w+)\s+(?:struct|interface)\b"],
            &[r"(?m)^func\s+(?:\([^)]*\)\s*)?(\w+)"],
        ),
        LanguageFamily::Jvm => PatternSet::new(
            &[r"(?m)^\s*import\s+(?:static\s+)?([\w.]*\w)(?:\.\*)?\s*;?\s*$"],
            &[r"(?m)^[ \t]*public\s+(?:(?:static|final|abstract|sealed)\s+)*(?:class|interface|enum|record)\s+(\w+)"],
            &[r"(?m)^[ \t]*(?:(?:public|private|protected|internal|abstract|final|static|sealed|data|open)\s+)*(?:interface|enum|record|object)\s+(\w+)"],
            &[
                r"(?m)^[ \t]*(?:(?:public|private|protected|internal|override|suspend|inline)\s+)*fun\s+(?:<[^>]*>\s*)?(?:\w+\.)?(\w+)",
                r"(?m)^[ \t]*(?:(?:public|private|protected|static|final|abstract|synchronized)\s+)+[\w<>\[\]?,]+\s+(\w+)\s*\([^;]*$",
            ],
        ),
        LanguageFamily::CFamily => PatternSet::new(
            &[
                r#"(?m)^\s*#\s*include\s*[<"]([^>"]+)[>"]"#,
                r"(?m)^\s*using\s+(?:static\s+)?([\w.]*\w)\s*;",
            ],
            &[],
            &[r"(?m)^[ \t]*(?:typedef\s+)?struct\s+(\w+)\s*\{"],
            &[],
        ),
        LanguageFamily::Other => PatternSet::default(),
    }
}

/// Regex-based extractor. Applies the generic shapes to every file and the
/// family-specific shapes chosen from the record's extension.
///
/// Never fails: a file that matches nothing yields an empty [`Extraction`].
pub struct HeuristicExtractor {
    generic: PatternSet,
    families: HashMap<LanguageFamily, PatternSet>,
    python_import: Vec<Regex>,
    go_import_block: Vec<Regex>,
    quoted: Vec<Regex>,
    rust_mod_decl: Vec<Regex>,
}

impl HeuristicExtractor {
    pub fn new() -> Self {
        let families = LanguageFamily::ALL
            .iter()
            .map(|&family| (family, family_patterns(family)))
            .collect();

        Self {
            generic: PatternSet::new(
                GENERIC_IMPORTS,
                GENERIC_EXPORTS,
                GENERIC_CLASSES,
                GENERIC_FUNCTIONS,
            ),
            families,
            python_import: compile(&[
                r"(?m)^[ \t]*import\s+([\w.]+(?:\s+as\s+\w+)?(?:\s*,\s*[\w.]+(?:\s+as\s+\w+)?)*)\s*$",
            ]),
            go_import_block: compile(&[r"(?s)\bimport\s*\((.*?)\)"]),
            quoted: compile(&[r#""([^"]+)""#]),
            rust_mod_decl: compile(&[r"(?m)^[ \t]*(?:pub(?:\([^)]*\))?\s+)?mod\s+(\w+)\s*;"]),
        }
    }

    /// Extract from a record, dispatching on its language family.
    pub fn extract(&self, record: &SourceRecord) -> Extraction {
        self.extract_text(&record.text(), record.family())
    }

    pub fn extract_text(&self, text: &str, family: LanguageFamily) -> Extraction {
        let mut out = Extraction::default();

        self.generic.apply(text, &mut out);
        if let Some(patterns) = self.families.get(&family) {
            patterns.apply(text, &mut out);
        }

        match family {
            LanguageFamily::Python => self.python_imports(text, &mut out),
            LanguageFamily::Go => {
                self.go_import_blocks(text, &mut out);
                go_exports(&mut out);
            }
            LanguageFamily::Rust => self.rust_mod_decls(text, &mut out),
            _ => {}
        }

        out
    }

    /// `import a.b as c, d` lines.
    fn python_imports(&self, text: &str, out: &mut Extraction) {
        let lists = self
            .python_import
            .iter()
            .flat_map(|re| re.captures_iter(text))
            .filter_map(|caps| caps.get(1));
        for list in lists {
            for item in list.as_str().split(',') {
                if let Some(module) = item.split_whitespace().next() {
                    push_unique(&mut out.imports, module);
                }
            }
        }
    }

    /// `mod x;` pulls in a child module file, recorded as `self::x`.
    fn rust_mod_decls(&self, text: &str, out: &mut Extraction) {
        let names = self
            .rust_mod_decl
            .iter()
            .flat_map(|re| re.captures_iter(text))
            .filter_map(|caps| caps.get(1));
        for name in names {
            push_unique(&mut out.imports, &format!("self::{}", name.as_str()));
        }
    }

    fn go_import_blocks(&self, text: &str, out: &mut Extraction) {
        let bodies = self
            .go_import_block
            .iter()
            .flat_map(|re| re.captures_iter(text))
            .filter_map(|caps| caps.get(1));
        for body in bodies {
            collect(&self.quoted, body.as_str(), &mut out.imports);
        }
    }
}

impl Default for HeuristicExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Go exports whatever starts with an upper-case letter.
fn go_exports(out: &mut Extraction) {
    let exported: Vec<String> = out
        .classes
        .iter()
        .chain(out.functions.iter())
        .filter(|name| name.chars().next().is_some_and(char::is_uppercase))
        .cloned()
        .collect();
    for name in exported {
        push_unique(&mut out.exports, &name);
    }
}
