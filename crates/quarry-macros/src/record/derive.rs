//! Expansion of `#[derive(Record)]`.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{spanned::Spanned, Data, DeriveInput, Error, Fields, Result};

use super::attrs::{parse_field_attrs, FieldKind};

pub fn record_derive_impl(input: DeriveInput) -> Result<TokenStream> {
    let struct_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(Error::new(
                    input.span(),
                    "Record can only be derived for structs with named fields",
                ))
            }
        },
        _ => return Err(Error::new(input.span(), "Record can only be derived for structs")),
    };

    let mut constants = Vec::new();
    let mut names = Vec::new();
    let mut reads = Vec::new();
    let mut writes = Vec::new();

    for field in fields {
        let ident = field
            .ident
            .as_ref()
            .ok_or_else(|| Error::new(field.span(), "expected named field"))?;
        let attr = parse_field_attrs(&field.attrs)?;
        if attr.skip {
            continue;
        }
        let Some(kind) = attr.kind else {
            continue;
        };

        let name = attr.rename.unwrap_or_else(|| ident.to_string());
        let const_name = format_ident!("{}", to_screaming_snake_case(&name));
        constants.push(quote! {
            pub const #const_name: &'static str = #name;
        });
        names.push(name.clone());

        let read = match kind {
            FieldKind::String => quote! { ::quarry_spec::Value::String(&self.#ident) },
            FieldKind::Number => quote! {
                ::quarry_spec::Value::Number(::quarry_spec::Number::from(self.#ident))
            },
            FieldKind::Timestamp => quote! {
                ::quarry_spec::Value::Timestamp(
                    ::quarry_spec::RecordTimestamp::to_timestamp(&self.#ident)
                )
            },
            FieldKind::Enum => quote! {
                ::quarry_spec::Value::Enum(::quarry_spec::RecordEnum::discriminant(&self.#ident))
            },
            FieldKind::Bool => quote! { ::quarry_spec::Value::Bool(self.#ident) },
        };
        reads.push(quote! { #name => #read, });

        if attr.readonly {
            continue;
        }
        let write = match kind {
            FieldKind::String => quote! {
                ::core::convert::Into::into(value.into_string(field)?)
            },
            FieldKind::Number => quote! { value.into_number(field)? },
            FieldKind::Timestamp => quote! {
                ::quarry_spec::RecordTimestamp::from_timestamp(value.into_timestamp(field)?)
            },
            FieldKind::Enum => quote! { ::quarry_spec::enum_from_value(field, value)? },
            FieldKind::Bool => quote! { value.into_bool(field)? },
        };
        writes.push(quote! { #name => self.#ident = #write, });
    }

    // A struct without writable fields keeps the trait's default `set_field`.
    let set_field = if writes.is_empty() {
        quote! {}
    } else {
        quote! {
            fn set_field(
                &mut self,
                field: &str,
                value: ::quarry_spec::FieldValue,
            ) -> ::quarry_spec::Result<()> {
                match field {
                    #(#writes)*
                    _ => return ::core::result::Result::Err(
                        ::quarry_spec::SpecError::unknown_field(field)
                    ),
                }
                ::core::result::Result::Ok(())
            }
        }
    };

    Ok(quote! {
        impl #impl_generics #struct_name #ty_generics #where_clause {
            #(#constants)*

            /// Every field name exposed to specifications.
            pub const FIELDS: &'static [&'static str] = &[#(#names),*];
        }

        impl #impl_generics ::quarry_spec::Record for #struct_name #ty_generics #where_clause {
            fn field_value(&self, field: &str) -> ::quarry_spec::Value<'_> {
                match field {
                    #(#reads)*
                    _ => ::quarry_spec::Value::None,
                }
            }

            #set_field
        }
    })
}

/// `createdAt` and `created_at` both become `CREATED_AT`.
fn to_screaming_snake_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    let mut after_lower = false;
    for c in s.chars() {
        match c {
            '_' | '-' | '.' => {
                out.push('_');
                after_lower = false;
            }
            c if c.is_uppercase() => {
                if after_lower {
                    out.push('_');
                }
                out.push(c);
                after_lower = false;
            }
            c => {
                out.push(c.to_ascii_uppercase());
                after_lower = c.is_lowercase() || c.is_ascii_digit();
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn screaming_snake_case() {
        assert_eq!(to_screaming_snake_case("name"), "NAME");
        assert_eq!(to_screaming_snake_case("created_at"), "CREATED_AT");
        assert_eq!(to_screaming_snake_case("createdAt"), "CREATED_AT");
        assert_eq!(to_screaming_snake_case("owner.name"), "OWNER_NAME");
        assert_eq!(to_screaming_snake_case("v2Count"), "V2_COUNT");
    }

    #[test]
    fn rejects_enums() {
        let input: DeriveInput = parse_quote! {
            enum Status { A, B }
        };
        let err = record_derive_impl(input).unwrap_err();
        assert!(err.to_string().contains("only be derived for structs"));
    }

    #[test]
    fn readonly_fields_are_not_written() {
        let input: DeriveInput = parse_quote! {
            struct Row {
                #[record(Number, readonly)]
                id: i64,
                #[record(String)]
                name: String,
                untouched: Vec<u8>,
            }
        };
        let expanded = record_derive_impl(input).unwrap().to_string();
        assert!(expanded.contains("\"id\" => :: quarry_spec :: Value :: Number"));
        assert!(!expanded.contains("\"id\" => self . id ="));
        assert!(expanded.contains("\"name\" => self . name ="));
        assert!(!expanded.contains("untouched"));
    }

    #[test]
    fn readonly_only_struct_keeps_default_set_field() {
        let input: DeriveInput = parse_quote! {
            struct View {
                #[record(Number, readonly)]
                id: i64,
            }
        };
        let expanded = record_derive_impl(input).unwrap().to_string();
        assert!(!expanded.contains("fn set_field"));
    }
}
