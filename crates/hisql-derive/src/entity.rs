//! Entity derive macro implementation

mod attrs;

use crate::common::syn_types::is_nullable;
use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Result};

struct FieldSpec<'a> {
    ident: &'a syn::Ident,
    name: String,
    column: Option<String>,
    persistent: bool,
    nullable: bool,
    is_id: bool,
}

impl FieldSpec<'_> {
    fn matches_key(&self, key: &str) -> bool {
        self.name.eq_ignore_ascii_case(key)
            || self
                .column
                .as_deref()
                .is_some_and(|c| c.eq_ignore_ascii_case(key))
    }
}

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Entity cannot be derived for generic types",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Entity can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Entity can only be derived for structs",
            ));
        }
    };

    let struct_attr = attrs::struct_attr(&input)?;

    let mut specs = Vec::with_capacity(fields.len());
    for field in fields {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let attr = attrs::field_attr(field)?;
        if attr.is_id && attr.skip {
            return Err(syn::Error::new_spanned(
                ident,
                "a key field cannot be skipped",
            ));
        }
        specs.push(FieldSpec {
            ident,
            name: ident.to_string(),
            column: attr.column,
            persistent: !attr.skip,
            nullable: attr.nullable.unwrap_or_else(|| is_nullable(&field.ty)),
            is_id: attr.is_id,
        });
    }

    // `#[orm(key = "...")]` wins over a field marked `#[orm(id)]`.
    let key = match struct_attr.key {
        Some(key) => Some(key),
        None => {
            let ids: Vec<_> = specs.iter().filter(|s| s.is_id).collect();
            if ids.len() > 1 {
                return Err(syn::Error::new_spanned(
                    ids[1].ident,
                    "only one field can be marked #[orm(id)]",
                ));
            }
            ids.first().map(|s| s.name.clone())
        }
    };
    let key_field = key
        .as_deref()
        .and_then(|k| specs.iter().find(|s| s.persistent && s.matches_key(k.trim())));

    let type_name = name.to_string();
    let table = option_str(struct_attr.table.as_deref());
    let key_tokens = option_str(key.as_deref());

    let field_defs = specs.iter().map(|s| {
        let field_name = &s.name;
        let column = option_str(s.column.as_deref());
        let persistent = s.persistent;
        let nullable = s.nullable;
        quote! {
            ::hisql::FieldDef {
                name: #field_name,
                column: #column,
                persistent: #persistent,
                nullable: #nullable,
            }
        }
    });

    let persistent: Vec<_> = specs.iter().filter(|s| s.persistent).collect();
    let read_arms = persistent.iter().map(|s| {
        let ident = s.ident;
        let field_name = &s.name;
        quote! {
            #field_name => ::core::option::Option::Some(::hisql::ToValue::to_value(&self.#ident)),
        }
    });
    let write_arms = persistent.iter().map(|s| {
        let ident = s.ident;
        let field_name = &s.name;
        quote! {
            #field_name => ::hisql::entity::assign(&mut self.#ident, value),
        }
    });

    let (key_value, set_key_value) = match key_field {
        Some(s) => {
            let ident = s.ident;
            (
                quote! { ::hisql::coerce::key_of(&self.#ident) },
                quote! { ::hisql::entity::assign(&mut self.#ident, ::hisql::Value::BigInt(key)) },
            )
        }
        None => {
            let kind = if key.as_deref().is_some_and(|k| !k.trim().is_empty()) {
                quote! { ::hisql::ConfigErrorKind::UnknownKeyField }
            } else {
                quote! { ::hisql::ConfigErrorKind::MissingKey }
            };
            (
                quote! { ::core::option::Option::None },
                quote! {
                    let _ = key;
                    ::core::result::Result::Err(::hisql::OrmError::Configuration {
                        entity: #type_name,
                        kind: #kind,
                    })
                },
            )
        }
    };

    Ok(quote! {
        impl ::hisql::Entity for #name {
            fn descriptor() -> &'static ::hisql::EntityDescriptor {
                static DESCRIPTOR: ::hisql::EntityDescriptor = ::hisql::EntityDescriptor {
                    type_name: #type_name,
                    table: #table,
                    key: #key_tokens,
                    fields: &[#(#field_defs),*],
                };
                &DESCRIPTOR
            }

            fn key_value(&self) -> ::core::option::Option<i64> {
                #key_value
            }

            fn set_key_value(&mut self, key: i64) -> ::hisql::OrmResult<()> {
                #set_key_value
            }

            fn field_value(&self, field: &str) -> ::core::option::Option<::hisql::Value> {
                match field {
                    #(#read_arms)*
                    _ => ::core::option::Option::None,
                }
            }

            fn set_field_value(
                &mut self,
                field: &str,
                value: ::hisql::Value,
            ) -> ::hisql::OrmResult<()> {
                match field {
                    #(#write_arms)*
                    _ => ::core::result::Result::Ok(()),
                }
            }
        }

        ::hisql::inventory::submit! {
            ::hisql::EntityRegistration {
                descriptor: <#name as ::hisql::Entity>::descriptor,
            }
        }
    })
}

fn option_str(value: Option<&str>) -> TokenStream {
    match value {
        Some(v) => quote! { ::core::option::Option::Some(#v) },
        None => quote! { ::core::option::Option::None },
    }
}
