/*!
Procedural macros for routedoc schema generation.

`#[derive(ApiSchema)]` implements `routedoc::ApiSchema` for structs and
unit-only enums, following the type's serde attributes so the documented
shape matches what is serialized.
*/

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ext::IdentExt;
use syn::{parse_macro_input, Attribute, Data, DataEnum, DeriveInput, Fields, LitStr};

/// Derive macro implementing `routedoc::ApiSchema`
///
/// Non-generic types are registered as components under their type name.
/// Generic types are inlined, since one name cannot describe every instantiation.
#[proc_macro_derive(ApiSchema, attributes(serde))]
pub fn derive_api_schema(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    generate_api_schema_impl(&input)
        .unwrap_or_else(|err| err.to_compile_error())
        .into()
}

fn generate_api_schema_impl(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let name_str = name.unraw().to_string();
    let container = SerdeAttrs::parse(&input.attrs)?;
    let description = doc_comment(&input.attrs);

    let body = match &input.data {
        Data::Struct(data_struct) => {
            generate_struct_schema(&name_str, &data_struct.fields, container.rename_all)?
        }
        Data::Enum(data_enum) => generate_enum_schema(&name_str, data_enum, container.rename_all)?,
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                input,
                "ApiSchema cannot be derived for union types",
            ));
        }
    };

    let set_description = description.map(|text| {
        quote! {
            if schema.description.is_none() {
                schema.description = Some(#text.to_string());
            }
        }
    });

    let mut generics = input.generics.clone();
    let schema_name = if generics.type_params().next().is_none() {
        quote! { Some(#name_str.to_string()) }
    } else {
        let params: Vec<syn::Ident> = generics.type_params().map(|p| p.ident.clone()).collect();
        let where_clause = generics.make_where_clause();
        for param in params {
            where_clause
                .predicates
                .push(syn::parse_quote!(#param: ::routedoc::ApiSchema));
        }
        quote! { None }
    };
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::routedoc::ApiSchema for #name #ty_generics #where_clause {
            fn schema_name() -> Option<String> {
                #schema_name
            }

            #[allow(unused_variables, unused_mut)]
            fn api_schema(
                registry: &mut ::routedoc::SchemaRegistry,
            ) -> ::routedoc::specification::Schema {
                let mut schema = { #body };
                #set_description
                schema
            }
        }
    })
}

fn generate_struct_schema(
    type_name: &str,
    fields: &Fields,
    rename_all: Option<RenameRule>,
) -> syn::Result<TokenStream2> {
    match fields {
        Fields::Named(named) => {
            let mut properties = Vec::new();
            let mut required = Vec::new();

            for field in &named.named {
                let attrs = SerdeAttrs::parse(&field.attrs)?;
                if attrs.skip {
                    continue;
                }
                let Some(ident) = &field.ident else {
                    continue;
                };
                let field_name = match (attrs.rename, rename_all) {
                    (Some(rename), _) => rename,
                    (None, Some(rule)) => rule.apply_to_field(&ident.unraw().to_string()),
                    (None, None) => ident.unraw().to_string(),
                };
                let ty = &field.ty;

                if !attrs.optional && !is_option_type(ty) {
                    required.push(field_name.clone());
                }

                let describe = doc_comment(&field.attrs).map(|text| {
                    quote! {
                        if let ::routedoc::ReferenceOr::Item(item) = &mut property {
                            if item.description.is_none() {
                                item.description = Some(#text.to_string());
                            }
                        }
                    }
                });

                properties.push(quote! {
                    {
                        #[allow(unused_mut)]
                        let mut property = registry.resolve::<#ty>();
                        #describe
                        schema.properties.insert(#field_name.to_string(), property);
                    }
                });
            }

            Ok(quote! {
                let mut schema = ::routedoc::specification::Schema::of_type("object");
                schema.title = Some(#type_name.to_string());
                #(#properties)*
                schema.required = vec![#(#required.to_string()),*];
                schema
            })
        }
        Fields::Unnamed(unnamed) if unnamed.unnamed.len() == 1 => {
            // newtypes serialize as their inner value
            let ty = &unnamed.unnamed[0].ty;
            Ok(quote! {
                match registry.resolve::<#ty>() {
                    ::routedoc::ReferenceOr::Item(inner) => inner,
                    reference => ::routedoc::specification::Schema {
                        all_of: vec![reference],
                        ..Default::default()
                    },
                }
            })
        }
        Fields::Unnamed(unnamed) => {
            // OpenAPI 3.0 has no tuple form, so positions are listed as alternatives
            let count = unnamed.unnamed.len();
            let types = unnamed.unnamed.iter().map(|field| &field.ty);
            Ok(quote! {
                let mut items = ::routedoc::specification::Schema::default();
                items.one_of = vec![#(registry.resolve::<#types>()),*];
                let mut schema = ::routedoc::specification::Schema::array(
                    ::routedoc::ReferenceOr::Item(items),
                );
                schema.title = Some(#type_name.to_string());
                schema.description = Some(format!("Tuple of {} values in fixed order", #count));
                schema
            })
        }
        Fields::Unit => Ok(quote! {
            ::routedoc::specification::Schema {
                title: Some(#type_name.to_string()),
                nullable: Some(true),
                ..Default::default()
            }
        }),
    }
}

fn generate_enum_schema(
    type_name: &str,
    data_enum: &DataEnum,
    rename_all: Option<RenameRule>,
) -> syn::Result<TokenStream2> {
    let mut variants = Vec::new();
    for variant in &data_enum.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "ApiSchema can only be derived for enums whose variants carry no data",
            ));
        }
        let attrs = SerdeAttrs::parse(&variant.attrs)?;
        if attrs.skip {
            continue;
        }
        let ident = variant.ident.unraw().to_string();
        variants.push(match (attrs.rename, rename_all) {
            (Some(rename), _) => rename,
            (None, Some(rule)) => rule.apply_to_variant(&ident),
            (None, None) => ident,
        });
    }

    Ok(quote! {
        let mut schema = ::routedoc::specification::Schema::of_type("string");
        schema.title = Some(#type_name.to_string());
        schema.enum_values = vec![#(::std::convert::From::from(#variants)),*];
        schema
    })
}

/// The serde attributes that change the serialized shape
#[derive(Default)]
struct SerdeAttrs {
    rename: Option<String>,
    rename_all: Option<RenameRule>,
    skip: bool,
    /// May be absent from serialized output
    optional: bool,
}

impl SerdeAttrs {
    fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut parsed = SerdeAttrs::default();
        for attr in attrs.iter().filter(|attr| attr.path().is_ident("serde")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") && meta.input.peek(syn::Token![=]) {
                    let value: LitStr = meta.value()?.parse()?;
                    parsed.rename = Some(value.value());
                } else if meta.path.is_ident("rename_all") && meta.input.peek(syn::Token![=]) {
                    let value: LitStr = meta.value()?.parse()?;
                    parsed.rename_all = Some(RenameRule::parse(&value)?);
                } else if meta.path.is_ident("skip") || meta.path.is_ident("skip_serializing") {
                    parsed.skip = true;
                } else if meta.path.is_ident("default") || meta.path.is_ident("skip_serializing_if") {
                    parsed.optional = true;
                    skip_meta_value(&meta)?;
                } else {
                    skip_meta_value(&meta)?;
                }
                Ok(())
            })?;
        }
        Ok(parsed)
    }
}

fn skip_meta_value(meta: &syn::meta::ParseNestedMeta<'_>) -> syn::Result<()> {
    if meta.input.peek(syn::Token![=]) {
        let _: syn::Expr = meta.value()?.parse()?;
    } else if meta.input.peek(syn::token::Paren) {
        let content;
        syn::parenthesized!(content in meta.input);
        let _: TokenStream2 = content.parse()?;
    }
    Ok(())
}

#[derive(Clone, Copy)]
enum RenameRule {
    Lower,
    Upper,
    Pascal,
    Camel,
    Snake,
    ScreamingSnake,
    Kebab,
    ScreamingKebab,
}

impl RenameRule {
    fn parse(lit: &LitStr) -> syn::Result<Self> {
        Ok(match lit.value().as_str() {
            "lowercase" => RenameRule::Lower,
            "UPPERCASE" => RenameRule::Upper,
            "PascalCase" => RenameRule::Pascal,
            "camelCase" => RenameRule::Camel,
            "snake_case" => RenameRule::Snake,
            "SCREAMING_SNAKE_CASE" => RenameRule::ScreamingSnake,
            "kebab-case" => RenameRule::Kebab,
            "SCREAMING-KEBAB-CASE" => RenameRule::ScreamingKebab,
            other => {
                return Err(syn::Error::new_spanned(
                    lit,
                    format!("unknown rename rule `{}`", other),
                ))
            }
        })
    }

    /// Fields are written in snake_case
    fn apply_to_field(self, field: &str) -> String {
        match self {
            RenameRule::Lower | RenameRule::Snake => field.to_string(),
            RenameRule::Upper | RenameRule::ScreamingSnake => field.to_ascii_uppercase(),
            RenameRule::Pascal => pascal_from_snake(field),
            RenameRule::Camel => {
                let pascal = pascal_from_snake(field);
                lower_first(&pascal)
            }
            RenameRule::Kebab => field.replace('_', "-"),
            RenameRule::ScreamingKebab => field.replace('_', "-").to_ascii_uppercase(),
        }
    }

    /// Variants are written in PascalCase
    fn apply_to_variant(self, variant: &str) -> String {
        match self {
            RenameRule::Lower => variant.to_ascii_lowercase(),
            RenameRule::Upper => variant.to_ascii_uppercase(),
            RenameRule::Pascal => variant.to_string(),
            RenameRule::Camel => lower_first(variant),
            RenameRule::Snake => snake_from_pascal(variant),
            RenameRule::ScreamingSnake => snake_from_pascal(variant).to_ascii_uppercase(),
            RenameRule::Kebab => snake_from_pascal(variant).replace('_', "-"),
            RenameRule::ScreamingKebab => snake_from_pascal(variant)
                .replace('_', "-")
                .to_ascii_uppercase(),
        }
    }
}

fn pascal_from_snake(field: &str) -> String {
    field
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

fn snake_from_pascal(variant: &str) -> String {
    let mut snake = String::new();
    for (i, ch) in variant.char_indices() {
        if i > 0 && ch.is_uppercase() {
            snake.push('_');
        }
        snake.push(ch.to_ascii_lowercase());
    }
    snake
}

fn lower_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// Joined `///` lines, if any
fn doc_comment(attrs: &[Attribute]) -> Option<String> {
    let lines: Vec<String> = attrs
        .iter()
        .filter_map(|attr| match &attr.meta {
            syn::Meta::NameValue(nv) if nv.path.is_ident("doc") => match &nv.value {
                syn::Expr::Lit(syn::ExprLit {
                    lit: syn::Lit::Str(text),
                    ..
                }) => Some(text.value().trim().to_string()),
                _ => None,
            },
            _ => None,
        })
        .filter(|line| !line.is_empty())
        .collect();

    if lines.is_empty() {
        None
    } else {
        Some(lines.join(" "))
    }
}

/// Helper function to check if a type is Option<T>
fn is_option_type(ty: &syn::Type) -> bool {
    if let syn::Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            return segment.ident == "Option";
        }
    }
    false
}
