//! FromRow derive macro implementation

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Result};

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "FromRow can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "FromRow can only be derived for structs",
            ));
        }
    };

    let mut field_extracts = Vec::with_capacity(fields.len());
    for field in fields {
        let Some(field_name) = field.ident.as_ref() else {
            return Err(syn::Error::new_spanned(field, "expected a named field"));
        };
        let column_name = column_name(field)?.unwrap_or_else(|| field_name.to_string());
        field_extracts.push(quote! {
            #field_name: ::roster::RowExt::try_get_column(row, #column_name)?
        });
    }

    Ok(quote! {
        impl #impl_generics ::roster::FromRow for #name #ty_generics #where_clause {
            fn from_row(row: &::roster::tokio_postgres::Row) -> ::roster::RosterResult<Self> {
                Ok(Self {
                    #(#field_extracts),*
                })
            }
        }
    })
}

/// Reads `#[roster(column = "...")]`; any other key is a compile error.
fn column_name(field: &syn::Field) -> Result<Option<String>> {
    let mut column = None;
    for attr in &field.attrs {
        if !attr.path().is_ident("roster") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("column") {
                let lit: syn::LitStr = meta.value()?.parse()?;
                column = Some(lit.value());
                Ok(())
            } else {
                Err(meta.error("unsupported roster attribute, expected `column = \"...\"`"))
            }
        })?;
    }
    Ok(column)
}
