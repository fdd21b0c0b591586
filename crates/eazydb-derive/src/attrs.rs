//! Field-level `#[orm(...)]` attributes.

use crate::sql_ident::parse_sql_ident_with_span;
use syn::{Error, Result};

/// Parsed `#[orm(column = "...", skip_fake)]`.
///
/// `skip_fake` is accepted and dropped.
#[derive(Default)]
pub(crate) struct FieldAttr {
    pub column: Option<String>,
}

impl syn::parse::Parse for FieldAttr {
    fn parse(input: syn::parse::ParseStream) -> Result<Self> {
        let mut attr = FieldAttr::default();

        while !input.is_empty() {
            let ident: syn::Ident = input.parse()?;
            if ident == "skip_fake" {
                // no-op marker
            } else if ident == "column" {
                let _: syn::Token![=] = input.parse()?;
                let value: syn::LitStr = input.parse()?;
                if attr.column.is_some() {
                    return Err(Error::new(value.span(), "duplicate `column` attribute"));
                }
                attr.column = Some(parse_sql_ident_with_span(
                    &value.value(),
                    value.span(),
                    "column name",
                )?);
            } else {
                return Err(Error::new(
                    ident.span(),
                    format!("unknown orm attribute `{ident}`, expected `column` or `skip_fake`"),
                ));
            }

            if input.peek(syn::Token![,]) {
                let _: syn::Token![,] = input.parse()?;
            } else {
                break;
            }
        }

        if !input.is_empty() {
            return Err(input.error("expected `,`"));
        }
        Ok(attr)
    }
}

/// Merge every `#[orm(...)]` on a field.
pub(crate) fn field_attr(field: &syn::Field) -> Result<FieldAttr> {
    let mut merged = FieldAttr::default();
    for attr in &field.attrs {
        if !attr.path().is_ident("orm") {
            continue;
        }
        let parsed: FieldAttr = attr.parse_args()?;
        if let Some(column) = parsed.column {
            if merged.column.is_some() {
                return Err(Error::new_spanned(attr, "duplicate `column` attribute"));
            }
            merged.column = Some(column);
        }
    }
    Ok(merged)
}
