//! Record derive macro implementation

use crate::attrs::field_attr;
use proc_macro2::TokenStream;
use quote::quote;
use std::collections::HashSet;
use syn::{Data, DeriveInput, Fields, Result};

struct Column<'a> {
    ident: &'a syn::Ident,
    ty: &'a syn::Type,
    name: String,
}

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Record can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Record can only be derived for structs",
            ));
        }
    };

    let mut columns = Vec::new();
    let mut untagged = Vec::new();
    let mut seen = HashSet::new();
    for field in fields {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        match field_attr(field)?.column {
            Some(column) => {
                if !seen.insert(column.clone()) {
                    return Err(syn::Error::new_spanned(
                        field,
                        format!("duplicate column '{column}'"),
                    ));
                }
                columns.push(Column {
                    ident,
                    ty: &field.ty,
                    name: column,
                });
            }
            None => untagged.push(ident),
        }
    }

    let defs = columns.iter().map(|c| {
        let col = &c.name;
        let ty = c.ty;
        quote! {
            ::eazydb::ColumnDef {
                name: #col,
                kind: <#ty as ::eazydb::ColumnValue>::KIND,
            }
        }
    });
    let values = columns.iter().map(|c| {
        let ident = c.ident;
        quote! {
            ::eazydb::FieldValue {
                value: ::eazydb::ColumnValue::to_value(&self.#ident),
                zero: ::eazydb::ColumnValue::is_zero(&self.#ident),
            }
        }
    });

    let record_impl = quote! {
        impl #impl_generics ::eazydb::Record for #name #ty_generics #where_clause {
            const COLUMNS: &'static [::eazydb::ColumnDef] = &[#(#defs),*];

            fn values(&self) -> ::std::vec::Vec<::eazydb::FieldValue> {
                ::std::vec![#(#values),*]
            }
        }
    };

    // Borrowed fields cannot be decoded from an owned row.
    if input.generics.lifetimes().next().is_some() {
        return Ok(record_impl);
    }

    let decoded = columns.iter().map(|c| {
        let ident = c.ident;
        let col = &c.name;
        quote! { #ident: row.decode(#col)? }
    });
    let defaulted = untagged.iter().map(|ident| {
        quote! { #ident: ::core::default::Default::default() }
    });

    Ok(quote! {
        #record_impl

        impl #impl_generics ::eazydb::FromRecord for #name #ty_generics #where_clause {
            fn from_row(row: &::eazydb::RowRef<'_>) -> ::eazydb::OrmResult<Self> {
                ::core::result::Result::Ok(Self {
                    #(#decoded,)*
                    #(#defaulted,)*
                })
            }
        }

        impl #impl_generics ::eazydb::FromRowSet for #name #ty_generics #where_clause {
            fn from_row_set(rows: &::eazydb::RowSet) -> ::eazydb::OrmResult<Self> {
                ::eazydb::first_record(rows)
            }
        }
    })
}
