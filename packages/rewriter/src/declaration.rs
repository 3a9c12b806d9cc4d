use playbox_common::Span;
use serde::Serialize;

/// Which rule a rewritten declaration fell under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeclarationKind {
    /// `import "./x.css"`: deleted
    ResourceImport,
    /// `import A, { a } from "m"` or `import A, * as N from "m"`
    CombinedImport,
    /// `import * as N from "m"`
    NamespaceImport,
    /// `import { a, b as c } from "m"`
    NamedImport,
    /// `import A from "m"`
    DefaultImport,
    /// `import "m"`: deleted
    SideEffectImport,
    /// `export default function|class|const Name`: prefix stripped, name recorded
    DefaultDeclaration,
    /// `export default Name;`: removed, name recorded
    DefaultReference,
    /// `export default <expression>`: prefix stripped
    DefaultExpression,
    /// `export const|let|var|function|class X`: keyword stripped
    NamedDeclaration,
    /// `export { A, B }`: deleted
    ExportList,
    /// `export * from "m"`, `export { a } from "m"`: deleted
    ReExport,
}

impl DeclarationKind {
    pub fn is_import(&self) -> bool {
        matches!(
            self,
            DeclarationKind::ResourceImport
                | DeclarationKind::CombinedImport
                | DeclarationKind::NamespaceImport
                | DeclarationKind::NamedImport
                | DeclarationKind::DefaultImport
                | DeclarationKind::SideEffectImport
        )
    }
}

/// One rewritten declaration, located in the original text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Declaration {
    pub kind: DeclarationKind,
    pub span: Span,
    pub module: Option<String>,
    /// Default-export name, when the declaration carries one
    pub binding: Option<String>,
}

/// `imported as local`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Specifier {
    pub imported: String,
    pub local: String,
}

impl Specifier {
    /// Destructuring form: `a` or `a: b`
    pub fn to_pattern(&self) -> String {
        if self.imported == self.local {
            self.local.clone()
        } else {
            format!("{}: {}", self.imported, self.local)
        }
    }
}

/// The binding part of an import declaration
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImportClause {
    pub default: Option<String>,
    pub namespace: Option<String>,
    pub named: Option<Vec<Specifier>>,
}

impl ImportClause {
    pub fn kind(&self) -> DeclarationKind {
        match (&self.default, &self.namespace, &self.named) {
            (Some(_), None, None) => DeclarationKind::DefaultImport,
            (Some(_), _, _) => DeclarationKind::CombinedImport,
            (None, Some(_), _) => DeclarationKind::NamespaceImport,
            (None, None, _) => DeclarationKind::NamedImport,
        }
    }
}
