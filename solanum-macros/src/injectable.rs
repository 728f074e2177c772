//! `#[injectable]` attribute macro
//!
//! Generates an `Injectable` impl whose provider is a factory over the
//! `#[inject]` fields, and an `inventory` submission that registers it.

use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::{format_ident, quote};
use syn::{parse_macro_input, Data, DeriveInput, Fields, LitStr, Meta};

/// Factories accept at most this many parameters
const MAX_INJECTED: usize = 8;

#[derive(Default)]
struct InjectableArgs {
    key: Option<LitStr>,
    transient: bool,
}

/// How a field is filled
enum FieldSource {
    Default,
    ByType,
    ByKey(LitStr),
}

pub fn injectable_impl(attr: TokenStream, input: TokenStream) -> TokenStream {
    let mut args = InjectableArgs::default();
    let args_parser = syn::meta::parser(|meta| {
        if meta.path.is_ident("key") {
            args.key = Some(meta.value()?.parse()?);
            Ok(())
        } else if meta.path.is_ident("transient") {
            args.transient = true;
            Ok(())
        } else {
            Err(meta.error("expected `key = \"...\"` or `transient`"))
        }
    });
    parse_macro_input!(attr with args_parser);

    let input = parse_macro_input!(input as DeriveInput);
    match expand(args, input) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

fn expand(args: InjectableArgs, input: DeriveInput) -> syn::Result<TokenStream2> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "injectable does not support generic types",
        ));
    }

    let data = match &input.data {
        Data::Struct(data) => data,
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "injectable can only be used on structs",
            ))
        }
    };

    let name = &input.ident;
    let vis = &input.vis;
    let attrs = &input.attrs;
    let key = args
        .key
        .unwrap_or_else(|| LitStr::new(&to_snake_case(&name.to_string()), Span::call_site()));

    let mut params = Vec::new();
    let mut descriptors = Vec::new();

    let (definition, construct) = match &data.fields {
        Fields::Named(fields) => {
            let mut field_definitions = Vec::new();
            let mut field_initializations = Vec::new();

            for field in &fields.named {
                let Some(field_name) = field.ident.as_ref() else {
                    continue;
                };
                let field_ty = &field.ty;
                let field_vis = &field.vis;
                let other_attrs = field
                    .attrs
                    .iter()
                    .filter(|attr| !attr.path().is_ident("inject"));

                field_definitions.push(quote! {
                    #(#other_attrs)*
                    #field_vis #field_name: #field_ty
                });

                let dependency_key = match field_source(field)? {
                    FieldSource::Default => {
                        field_initializations.push(quote! {
                            #field_name: ::std::default::Default::default()
                        });
                        continue;
                    }
                    FieldSource::ByType => LitStr::new("", Span::call_site()),
                    FieldSource::ByKey(key) => key,
                };

                let param = format_ident!("__solanum_{}", field_name);
                field_initializations.push(quote! { #field_name: #param });
                descriptors.push(quote! {
                    ::solanum::DependencyDescriptor::new(
                        #dependency_key,
                        ::std::option::Option::Some(<#field_ty as ::solanum::Inject>::token()),
                    )
                });
                params.push(quote! { #param: #field_ty });
            }

            (
                quote! {
                    #(#attrs)*
                    #vis struct #name {
                        #(#field_definitions),*
                    }
                },
                quote! { Self { #(#field_initializations),* } },
            )
        }
        Fields::Unit => (
            quote! {
                #(#attrs)*
                #vis struct #name;
            },
            quote! { Self },
        ),
        Fields::Unnamed(_) => {
            return Err(syn::Error::new_spanned(
                &input,
                "injectable does not support tuple structs. Use named fields instead.",
            ))
        }
    };

    if params.len() > MAX_INJECTED {
        return Err(syn::Error::new_spanned(
            &input.ident,
            format!("injectable supports at most {} #[inject] fields", MAX_INJECTED),
        ));
    }

    let lifecycle = if args.transient {
        quote! { .transient() }
    } else {
        quote! { .singleton() }
    };

    Ok(quote! {
        #definition

        impl ::solanum::Injectable for #name {
            const KEY: &'static str = #key;

            fn provider() -> ::solanum::Provider<Self> {
                ::solanum::Provider::factory(|#(#params),*| #construct)
                    .with_dependencies(::std::vec![#(#descriptors),*])
                    #lifecycle
            }
        }

        ::solanum::inventory::submit! {
            ::solanum::container::provider::ProviderRegistration {
                key: #key,
                register: |container: &::solanum::Container| {
                    container.register_injectable::<#name>()
                },
            }
        }
    })
}

/// Read the `#[inject]` attribute of a field, if any
fn field_source(field: &syn::Field) -> syn::Result<FieldSource> {
    let Some(attr) = field.attrs.iter().find(|attr| attr.path().is_ident("inject")) else {
        return Ok(FieldSource::Default);
    };

    match &attr.meta {
        Meta::Path(_) => Ok(FieldSource::ByType),
        Meta::List(_) => {
            let mut key = None;
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("key") {
                    key = Some(meta.value()?.parse::<LitStr>()?);
                    Ok(())
                } else {
                    Err(meta.error("expected `key = \"...\"`"))
                }
            })?;
            Ok(key.map_or(FieldSource::ByType, FieldSource::ByKey))
        }
        Meta::NameValue(_) => Err(syn::Error::new_spanned(
            attr,
            "use #[inject] or #[inject(key = \"...\")]",
        )),
    }
}

fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let chars: Vec<char> = name.chars().collect();
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev_lower = i > 0 && (chars[i - 1].is_lowercase() || chars[i - 1].is_ascii_digit());
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let prev_upper = i > 0 && chars[i - 1].is_uppercase();
            if prev_lower || (prev_upper && next_lower) {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::to_snake_case;

    #[test]
    fn test_to_snake_case() {
        assert_eq!(to_snake_case("UserService"), "user_service");
        assert_eq!(to_snake_case("HTTPClient"), "http_client");
        assert_eq!(to_snake_case("Oauth2Provider"), "oauth2_provider");
        assert_eq!(to_snake_case("cache"), "cache");
    }
}
