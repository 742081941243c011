//! Implementation of `#[derive(Validate)]`.
//!
//! Parses `#[validate(...)]` attributes on struct fields and generates a
//! `validate(&self) -> Result<(), Vec<String>>` method.

use proc_macro2::TokenStream;
use quote::quote;
use syn::meta::ParseNestedMeta;
use syn::{DeriveInput, LitStr, Result};

/// Parsed validation rules for a single field.
struct FieldRules {
    field_name: syn::Ident,
    non_empty: bool,
    pattern: Option<String>,
    nested: bool,
}

impl FieldRules {
    fn parse(field: &syn::Field) -> Result<Option<Self>> {
        let Some(field_name) = field.ident.clone() else {
            return Err(syn::Error::new_spanned(field, "Validate requires named fields"));
        };

        let mut rules = FieldRules {
            field_name,
            non_empty: false,
            pattern: None,
            nested: false,
        };

        let mut has_validate = false;
        for attr in &field.attrs {
            if !attr.path().is_ident("validate") {
                continue;
            }
            has_validate = true;
            attr.parse_nested_meta(|meta| rules.parse_rule(meta))?;
        }

        if has_validate {
            Ok(Some(rules))
        } else {
            Ok(None)
        }
    }

    fn parse_rule(&mut self, meta: ParseNestedMeta) -> Result<()> {
        if meta.path.is_ident("non_empty") {
            self.non_empty = true;
            return Ok(());
        }

        if meta.path.is_ident("nested") {
            self.nested = true;
            return Ok(());
        }

        if meta.path.is_ident("pattern") {
            let value = meta.value()?;
            let lit: LitStr = value.parse()?;
            let pattern = lit.value();
            if let Err(e) = regex::Regex::new(&pattern) {
                return Err(syn::Error::new_spanned(lit, format!("invalid pattern: {e}")));
            }
            self.pattern = Some(pattern);
            return Ok(());
        }

        Err(meta.error("unknown validate rule; expected non_empty, pattern, or nested"))
    }

    fn generate_checks(&self) -> TokenStream {
        let field_name = &self.field_name;
        let field_str = field_name.to_string();
        let mut checks = Vec::new();

        if self.non_empty {
            checks.push(quote! {
                if self.#field_name.is_empty() {
                    errors.push(format!("{}: must not be empty", #field_str));
                }
            });
        }

        // Empty values are reported by `non_empty`; a pattern only judges
        // what was actually supplied.
        if let Some(pattern) = &self.pattern {
            checks.push(quote! {
                {
                    static PATTERN: ::std::sync::OnceLock<::regex::Regex> =
                        ::std::sync::OnceLock::new();
                    let re = PATTERN.get_or_init(|| {
                        ::regex::Regex::new(#pattern).expect("pattern checked at expansion")
                    });
                    if !self.#field_name.is_empty() && !re.is_match(&self.#field_name) {
                        errors.push(format!("{}: has an invalid format", #field_str));
                    }
                }
            });
        }

        if self.nested {
            checks.push(quote! {
                if let ::std::result::Result::Err(inner) = self.#field_name.validate() {
                    errors.extend(inner.into_iter().map(|e| format!("{}.{}", #field_str, e)));
                }
            });
        }

        quote! { #(#checks)* }
    }
}

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;

    let fields = match &input.data {
        syn::Data::Struct(data) => match &data.fields {
            syn::Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "Validate only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "Validate can only be derived for structs",
            ));
        }
    };

    let mut all_checks = Vec::new();
    for field in fields {
        if let Some(rules) = FieldRules::parse(field)? {
            all_checks.push(rules.generate_checks());
        }
    }

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics #name #ty_generics #where_clause {
            /// Validate this struct according to its field-level constraints.
            ///
            /// Returns `Ok(())` if all constraints pass, or `Err(Vec<String>)`
            /// with a list of human-readable validation error messages.
            pub fn validate(&self) -> ::std::result::Result<(), ::std::vec::Vec<::std::string::String>> {
                let mut errors = ::std::vec::Vec::new();
                #(#all_checks)*
                if errors.is_empty() {
                    ::std::result::Result::Ok(())
                } else {
                    ::std::result::Result::Err(errors)
                }
            }
        }
    })
}
