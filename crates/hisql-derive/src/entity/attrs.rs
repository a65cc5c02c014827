//! Attribute parsing for the Entity derive macro.
//!
//! Struct level: `#[orm(table = "...", key = "...")]`.
//! Field level: `#[orm(id)]`, `#[orm(column = "...")]`, `#[orm(skip)]`,
//! `#[orm(nullable)]`, `#[orm(not_null)]`.

use syn::{DeriveInput, Result};

/// Struct-level settings. Both are optional here; a missing table or key is reported
/// when the entity is first resolved.
#[derive(Default)]
pub(super) struct StructAttr {
    pub table: Option<String>,
    pub key: Option<String>,
}

impl syn::parse::Parse for StructAttr {
    fn parse(input: syn::parse::ParseStream) -> Result<Self> {
        let mut attr = StructAttr::default();
        while !input.is_empty() {
            let ident: syn::Ident = input.parse()?;
            let _: syn::Token![=] = input.parse()?;
            let value: syn::LitStr = input.parse()?;
            if ident == "table" {
                attr.table = Some(value.value());
            } else if ident == "key" {
                attr.key = Some(value.value());
            } else {
                return Err(syn::Error::new_spanned(
                    ident,
                    "unknown entity attribute, expected `table` or `key`",
                ));
            }
            if input.peek(syn::Token![,]) {
                let _: syn::Token![,] = input.parse()?;
            } else {
                break;
            }
        }
        Ok(attr)
    }
}

/// Field-level settings.
#[derive(Default)]
pub(super) struct FieldAttr {
    pub is_id: bool,
    pub column: Option<String>,
    pub skip: bool,
    pub nullable: Option<bool>,
}

impl syn::parse::Parse for FieldAttr {
    fn parse(input: syn::parse::ParseStream) -> Result<Self> {
        let mut attr = FieldAttr::default();
        while !input.is_empty() {
            let ident: syn::Ident = input.parse()?;
            if ident == "column" {
                let _: syn::Token![=] = input.parse()?;
                let value: syn::LitStr = input.parse()?;
                attr.column = Some(value.value());
            } else if ident == "id" {
                attr.is_id = true;
            } else if ident == "skip" {
                attr.skip = true;
            } else if ident == "nullable" {
                attr.nullable = Some(true);
            } else if ident == "not_null" {
                attr.nullable = Some(false);
            } else {
                return Err(syn::Error::new_spanned(
                    ident,
                    "unknown field attribute, expected `id`, `column`, `skip`, `nullable` or `not_null`",
                ));
            }
            if input.peek(syn::Token![,]) {
                let _: syn::Token![,] = input.parse()?;
            } else {
                break;
            }
        }
        Ok(attr)
    }
}

fn orm_attrs(attrs: &[syn::Attribute]) -> impl Iterator<Item = &syn::Attribute> {
    attrs.iter().filter(|a| a.path().is_ident("orm"))
}

/// Merge every struct-level `#[orm(...)]` attribute. Later values win.
pub(super) fn struct_attr(input: &DeriveInput) -> Result<StructAttr> {
    let mut out = StructAttr::default();
    for attr in orm_attrs(&input.attrs) {
        let parsed: StructAttr = attr.parse_args()?;
        if parsed.table.is_some() {
            out.table = parsed.table;
        }
        if parsed.key.is_some() {
            out.key = parsed.key;
        }
    }
    Ok(out)
}

/// Merge every `#[orm(...)]` attribute on a field.
pub(super) fn field_attr(field: &syn::Field) -> Result<FieldAttr> {
    let mut out = FieldAttr::default();
    for attr in orm_attrs(&field.attrs) {
        let parsed: FieldAttr = attr.parse_args()?;
        out.is_id |= parsed.is_id;
        out.skip |= parsed.skip;
        if parsed.column.is_some() {
            out.column = parsed.column;
        }
        if parsed.nullable.is_some() {
            out.nullable = parsed.nullable;
        }
    }
    Ok(out)
}
