//! Parsing of `#[record(...)]` field attributes.

use proc_macro2::Span;
use syn::{
    parse::{Parse, ParseStream},
    punctuated::Punctuated,
    spanned::Spanned,
    Attribute, Error, Expr, ExprLit, Ident, Lit, Meta, Result, Token,
};

const KINDS: &str = "String, Number, Timestamp, Enum, Bool";

/// How a field is exposed to specifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Number,
    Timestamp,
    Enum,
    Bool,
}

impl FieldKind {
    fn parse(name: &str, span: Span) -> Result<Self> {
        match name {
            "String" | "string" => Ok(FieldKind::String),
            "Number" | "number" => Ok(FieldKind::Number),
            "Timestamp" | "timestamp" => Ok(FieldKind::Timestamp),
            "Enum" | "enum" => Ok(FieldKind::Enum),
            "Bool" | "bool" => Ok(FieldKind::Bool),
            other => Err(Error::new(
                span,
                format!("unknown record field kind '{other}', expected one of: {KINDS}"),
            )),
        }
    }

    fn from_ident(ident: &Ident) -> Result<Self> {
        Self::parse(&ident.to_string(), ident.span())
    }
}

/// Options from one field's `#[record(...)]` attribute.
#[derive(Debug, Clone, Default)]
pub struct FieldAttr {
    pub kind: Option<FieldKind>,
    pub skip: bool,
    /// Exposed for reading only; assignments to it fail as unknown fields.
    pub readonly: bool,
    pub rename: Option<String>,
}

fn string_value(expr: &Expr, what: &str) -> Result<(String, Span)> {
    match expr {
        Expr::Lit(ExprLit {
            lit: Lit::Str(s), ..
        }) => Ok((s.value(), s.span())),
        other => Err(Error::new(
            other.span(),
            format!("{what} must be a string literal"),
        )),
    }
}

impl Parse for FieldAttr {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut attr = FieldAttr::default();
        let items: Punctuated<Meta, Token![,]> = Punctuated::parse_terminated(input)?;

        for meta in items {
            match &meta {
                Meta::Path(path) if path.is_ident("skip") => attr.skip = true,
                Meta::Path(path) if path.is_ident("readonly") => attr.readonly = true,
                Meta::Path(path) => {
                    let ident = path.get_ident().ok_or_else(|| {
                        Error::new(path.span(), format!("expected {KINDS}, skip or readonly"))
                    })?;
                    if attr.kind.is_some() {
                        return Err(Error::new(ident.span(), "field kind given twice"));
                    }
                    attr.kind = Some(FieldKind::from_ident(ident)?);
                }
                Meta::NameValue(nv) if nv.path.is_ident("rename") => {
                    attr.rename = Some(string_value(&nv.value, "rename")?.0);
                }
                Meta::NameValue(nv) if nv.path.is_ident("kind") => {
                    let (name, span) = string_value(&nv.value, "kind")?;
                    attr.kind = Some(FieldKind::parse(&name, span)?);
                }
                _ => {
                    return Err(Error::new(
                        meta.span(),
                        format!(
                            "unknown record attribute, expected {KINDS}, skip, readonly, rename = \"...\" or kind = \"...\""
                        ),
                    ))
                }
            }
        }

        Ok(attr)
    }
}

/// Reads the `#[record(...)]` attribute of a field, if any.
pub fn parse_field_attrs(attrs: &[Attribute]) -> Result<FieldAttr> {
    match attrs.iter().find(|a| a.path().is_ident("record")) {
        Some(attr) => attr.parse_args::<FieldAttr>(),
        None => Ok(FieldAttr::default()),
    }
}
