//! Import specifier scanner.
//!
//! Walks JavaScript/TypeScript source once, skipping comments and string
//! literals, and picks up the string argument of `import`, `export ... from`,
//! `import()` and `require()`.

use serde::Serialize;
use std::collections::HashSet;

/// How a specifier was imported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportKind {
    /// `import x from "..."` or `import "..."`.
    EsmImport,
    /// `export ... from "..."`.
    EsmExport,
    /// `import("...")`.
    DynamicImport,
    /// `require("...")`.
    CjsRequire,
}

impl ImportKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EsmImport => "esm_import",
            Self::EsmExport => "esm_export",
            Self::DynamicImport => "dynamic_import",
            Self::CjsRequire => "cjs_require",
        }
    }
}

/// Import specifier found in source code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportSpec {
    /// Specifier exactly as written.
    pub raw: String,
    pub kind: ImportKind,
    /// Line of the statement (1-indexed).
    pub line: u32,
}

/// Scan source code for import/require specifiers.
///
/// Returns discovered imports in first-appearance order, deduplicated by `raw`.
#[must_use]
pub fn scan_imports(source: &str) -> Vec<ImportSpec> {
    let mut cursor = Cursor::new(source);
    let mut results = Vec::new();
    let mut seen = HashSet::new();

    while let Some(c) = cursor.peek() {
        if cursor.skip_comment() {
            continue;
        }
        if is_quote(c) {
            cursor.skip_string();
            continue;
        }

        let line = cursor.line;
        let found = if cursor.at_keyword("import") {
            cursor.attempt("import", Cursor::import_tail)
        } else if cursor.at_keyword("export") {
            cursor
                .attempt("export", Cursor::export_tail)
                .map(|raw| (raw, ImportKind::EsmExport))
        } else if cursor.at_keyword("require") {
            cursor
                .attempt("require", Cursor::call_argument)
                .map(|raw| (raw, ImportKind::CjsRequire))
        } else {
            cursor.bump();
            None
        };

        if let Some((raw, kind)) = found {
            if !raw.is_empty() && seen.insert(raw.clone()) {
                results.push(ImportSpec { raw, kind, line });
            }
        }
    }

    results
}

fn is_quote(c: char) -> bool {
    matches!(c, '"' | '\'' | '`')
}

fn is_ident(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Longest stretch scanned between `import` and `from`.
const MAX_CLAUSE_LEN: usize = 1000;

struct Cursor {
    chars: Vec<char>,
    pos: usize,
    line: u32,
}

impl Cursor {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn advance(&mut self, n: usize) {
        for _ in 0..n {
            self.bump();
        }
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    /// Keyword at the cursor with identifier boundaries on both sides.
    fn at_keyword(&self, keyword: &str) -> bool {
        if self.pos > 0 && is_ident(self.chars[self.pos - 1]) {
            return false;
        }
        // `obj.import` / `x.require` are property accesses
        if self.pos > 0 && self.chars[self.pos - 1] == '.' {
            return false;
        }
        let n = keyword.chars().count();
        let matches = keyword
            .chars()
            .enumerate()
            .all(|(i, k)| self.peek_at(i) == Some(k));
        matches && !self.peek_at(n).is_some_and(is_ident)
    }

    /// Run `tail` after the keyword; on failure rewind to just past the
    /// keyword's first character.
    fn attempt<T>(&mut self, keyword: &str, tail: fn(&mut Self) -> Option<T>) -> Option<T> {
        let (pos, line) = (self.pos, self.line);
        self.advance(keyword.len());
        let found = tail(self);
        if found.is_none() {
            self.pos = pos + 1;
            self.line = line;
        }
        found
    }

    fn skip_comment(&mut self) -> bool {
        match (self.peek(), self.peek_at(1)) {
            (Some('/'), Some('/')) => {
                while self.peek().is_some_and(|c| c != '\n') {
                    self.bump();
                }
                true
            }
            (Some('/'), Some('*')) => {
                self.advance(2);
                while self.peek().is_some() {
                    if self.peek() == Some('*') && self.peek_at(1) == Some('/') {
                        break;
                    }
                    self.bump();
                }
                self.advance(2);
                true
            }
            _ => false,
        }
    }

    fn skip_string(&mut self) {
        let Some(quote) = self.bump() else { return };
        while let Some(c) = self.bump() {
            if c == '\\' {
                self.bump();
            } else if c == quote {
                return;
            }
        }
    }

    /// Read a static string literal at the cursor.
    ///
    /// Template literals with substitutions and strings broken by a newline
    /// are not static specifiers.
    fn read_string(&mut self) -> Option<String> {
        let quote = self.peek().filter(|&c| is_quote(c))?;
        self.bump();
        let mut value = String::new();
        while let Some(c) = self.bump() {
            match c {
                '\\' => value.push(self.bump()?),
                '\n' if quote != '`' => return None,
                '$' if quote == '`' && self.peek() == Some('{') => return None,
                c if c == quote => return Some(value),
                c => value.push(c),
            }
        }
        None
    }

    fn import_tail(&mut self) -> Option<(String, ImportKind)> {
        self.skip_ws();
        match self.peek()? {
            '(' => self
                .call_argument()
                .map(|raw| (raw, ImportKind::DynamicImport)),
            c if is_quote(c) => self.read_string().map(|raw| (raw, ImportKind::EsmImport)),
            // import.meta
            '.' => None,
            _ => self.from_clause().map(|raw| (raw, ImportKind::EsmImport)),
        }
    }

    fn export_tail(&mut self) -> Option<String> {
        self.skip_ws();
        match self.peek()? {
            '{' => {
                while self.peek().is_some_and(|c| c != '}') {
                    self.bump();
                }
                self.bump();
            }
            '*' => {
                self.bump();
                self.skip_ws();
                if self.at_keyword("as") {
                    self.advance(2);
                    self.skip_ws();
                    while self.peek().is_some_and(is_ident) {
                        self.bump();
                    }
                }
            }
            _ => return None,
        }
        self.skip_ws();
        if !self.at_keyword("from") {
            return None;
        }
        self.advance(4);
        self.skip_ws();
        self.read_string()
    }

    /// Scan an import clause up to `from "<specifier>"`.
    fn from_clause(&mut self) -> Option<String> {
        let limit = self.pos + MAX_CLAUSE_LEN;
        while let Some(c) = self.peek() {
            if self.pos > limit || c == ';' || is_quote(c) {
                return None;
            }
            if self.at_keyword("from") {
                self.advance(4);
                self.skip_ws();
                return self.read_string();
            }
            self.bump();
        }
        None
    }

    /// `( "<specifier>" )` after `require` or `import`.
    fn call_argument(&mut self) -> Option<String> {
        self.skip_ws();
        if self.peek()? != '(' {
            return None;
        }
        self.bump();
        self.skip_ws();
        let raw = self.read_string()?;
        self.skip_ws();
        // A specifier followed by more arguments or an expression is not static
        match self.peek() {
            Some(')' | ',') => Some(raw),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raws(source: &str) -> Vec<String> {
        scan_imports(source).into_iter().map(|i| i.raw).collect()
    }

    #[test]
    fn test_esm_import_forms() {
        let source = r#"
import foo from "default";
import { a, b as c } from 'named';
import * as ns from "./star";
import def, { x } from "mixed";
import "./side-effect";
"#;
        let imports = scan_imports(source);
        assert_eq!(
            imports.iter().map(|i| i.raw.as_str()).collect::<Vec<_>>(),
            vec!["default", "named", "./star", "mixed", "./side-effect"]
        );
        assert!(imports.iter().all(|i| i.kind == ImportKind::EsmImport));
    }

    #[test]
    fn test_dynamic_import() {
        let imports = scan_imports(r#"const mod = await import("./dynamic");"#);
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].raw, "./dynamic");
        assert_eq!(imports[0].kind, ImportKind::DynamicImport);
    }

    #[test]
    fn test_cjs_require() {
        let imports = scan_imports(r#"const sharp = require( "sharp" );"#);
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].raw, "sharp");
        assert_eq!(imports[0].kind, ImportKind::CjsRequire);
    }

    #[test]
    fn test_export_from() {
        let source = r#"
export { foo } from "./foo";
export * from "./all";
export * as ns from "./ns";
export const x = 1;
import y from "after";
"#;
        let imports = scan_imports(source);
        assert_eq!(imports[0].kind, ImportKind::EsmExport);
        assert_eq!(
            imports.iter().map(|i| i.raw.as_str()).collect::<Vec<_>>(),
            vec!["./foo", "./all", "./ns", "after"]
        );
        assert_eq!(imports[3].kind, ImportKind::EsmImport);
    }

    #[test]
    fn test_local_export_list_does_not_steal_next_import() {
        let source = "export { a };\nimport b from 'b';";
        let imports = scan_imports(source);
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].raw, "b");
        assert_eq!(imports[0].kind, ImportKind::EsmImport);
    }

    #[test]
    fn test_ignores_comments() {
        let source = r#"
// import foo from "line-comment"
/*
import bar from "block-comment"
*/
import real from "./real";
"#;
        assert_eq!(raws(source), vec!["./real"]);
    }

    #[test]
    fn test_ignores_strings_and_properties() {
        let source = r#"
const s = "require('in-string')";
const t = `import x from "in-template"`;
obj.require("not-a-require");
console.log(import.meta.url);
"#;
        assert!(raws(source).is_empty());
    }

    #[test]
    fn test_non_static_arguments_skipped() {
        let source = r#"
require(name);
require("a" + suffix);
import(`./locale/${lang}`);
require(`static-template`);
"#;
        assert_eq!(raws(source), vec!["static-template"]);
    }

    #[test]
    fn test_deduplicates_in_first_appearance_order() {
        let source = r#"
import a from "./dep";
const b = require("./other");
import c from "./dep";
"#;
        assert_eq!(raws(source), vec!["./dep", "./other"]);
    }

    #[test]
    fn test_line_numbers() {
        let source = r#"
import a from "./a";

const b = require("./b");
"#;
        let imports = scan_imports(source);
        assert_eq!(imports[0].line, 2);
        assert_eq!(imports[1].line, 4);
    }

    #[test]
    fn test_scoped_and_identifier_boundaries() {
        let source = r#"
import test from "@scope/package";
const myrequire = 1;
reimport("nope");
"#;
        assert_eq!(raws(source), vec!["@scope/package"]);
    }

    #[test]
    fn test_empty_source() {
        assert!(scan_imports("").is_empty());
        assert!(scan_imports("console.log('hello');").is_empty());
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(ImportKind::CjsRequire.as_str(), "cjs_require");
        assert_eq!(
            serde_json::to_string(&ImportKind::DynamicImport).unwrap(),
            r#""dynamic_import""#
        );
    }
}
