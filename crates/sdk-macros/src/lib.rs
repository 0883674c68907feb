//! Proc macros for the Sift SDK.
//!
//! Provides `#[derive(Searchable)]`, which turns `#[searchable(...)]` field
//! attributes into a static field capability list, and `#[derive(ClosedSet)]`,
//! which lists the member names of a unit-only enum.

use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use syn::ext::IdentExt;
use syn::meta::ParseNestedMeta;
use syn::{
    Attribute, Data, DeriveInput, Expr, ExprArray, Fields, Ident, Lit, LitBool, LitStr, Path,
    parse_macro_input,
};

/// Derives `DeclaresFields` (and `Searchable` when an entity is named).
///
/// # Example
///
/// ```ignore
/// #[derive(Searchable)]
/// #[searchable(entity = Question, table = "questions")]
/// struct Question {
///     #[searchable(flatten)]
///     base: BaseEntity,
///     #[searchable(display_name = "Exam Type", enum_class = ExamType, synonyms = ["exam"])]
///     exam_type: ExamType,
///     options: Vec<String>, // not queryable
/// }
/// ```
///
/// Field keys: `name`, `display_name`, `field_type` (`"string"`, `"integer"`,
/// `"date_string"`, `"boolean"`), `searchable`, `filterable`, `sortable`,
/// `value_source` (`"database"`, `"enum"`), `enum_class`, `synonyms`, and
/// `flatten` for structs whose own fields should be spliced in.
#[proc_macro_derive(Searchable, attributes(searchable))]
pub fn derive_searchable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_searchable(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Derives `ClosedSet` for a unit-only enum.
///
/// Member names default to the SCREAMING_SNAKE_CASE form of each variant;
/// `#[closed_set(rename = "...")]` overrides one.
#[proc_macro_derive(ClosedSet, attributes(closed_set))]
pub fn derive_closed_set(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_closed_set(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

// ---------------------------------------------------------------------------
// Searchable
// ---------------------------------------------------------------------------

/// Container-level `#[searchable(entity = ..., table = "...")]`.
#[derive(Default)]
struct EntityAttr {
    entity: Option<Ident>,
    table: Option<LitStr>,
}

/// Field-level `#[searchable(...)]`.
#[derive(Default)]
struct FieldAttr {
    flatten: bool,
    name: Option<LitStr>,
    display_name: Option<LitStr>,
    field_type: Option<TokenStream2>,
    searchable: Option<LitBool>,
    filterable: Option<LitBool>,
    sortable: Option<LitBool>,
    value_source: Option<TokenStream2>,
    enum_class: Option<Path>,
    synonyms: Vec<LitStr>,
}

fn expand_searchable(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "Searchable can only be derived for structs",
        ));
    };
    let Fields::Named(named) = &data.fields else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "Searchable requires named fields",
        ));
    };

    let entity = parse_entity_attr(&input.attrs)?;

    let mut pushes = Vec::new();
    for field in &named.named {
        let Some(ident) = &field.ident else {
            continue;
        };
        let physical = ident.unraw().to_string();

        let Some(attr) = parse_field_attr(&field.attrs)? else {
            pushes.push(quote! {
                fields.push(::sift_sdk::DeclaredField {
                    name: #physical,
                    capability: ::std::option::Option::None,
                });
            });
            continue;
        };

        if attr.flatten {
            let ty = &field.ty;
            pushes.push(quote! {
                fields.extend(<#ty as ::sift_sdk::DeclaresFields>::declared_fields());
            });
            continue;
        }

        let capability = capability_tokens(attr);
        pushes.push(quote! {
            fields.push(::sift_sdk::DeclaredField {
                name: #physical,
                capability: ::std::option::Option::Some(#capability),
            });
        });
    }

    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let searchable_impl = match (entity.entity, entity.table) {
        (Some(entity), Some(table)) => quote! {
            impl #impl_generics ::sift_sdk::Searchable for #ident #ty_generics #where_clause {
                const ENTITY_TYPE: ::sift_sdk::EntityType = ::sift_sdk::EntityType::#entity;
                const TABLE: &'static str = #table;
            }
        },
        (None, None) => TokenStream2::new(),
        (Some(entity), None) => {
            return Err(syn::Error::new_spanned(
                entity,
                "`entity` requires a `table` as well",
            ));
        }
        (None, Some(table)) => {
            return Err(syn::Error::new_spanned(
                table,
                "`table` requires an `entity` as well",
            ));
        }
    };

    Ok(quote! {
        impl #impl_generics ::sift_sdk::DeclaresFields for #ident #ty_generics #where_clause {
            fn declared_fields() -> ::std::vec::Vec<::sift_sdk::DeclaredField> {
                let mut fields = ::std::vec::Vec::new();
                #(#pushes)*
                fields
            }
        }

        #searchable_impl
    })
}

fn parse_entity_attr(attrs: &[Attribute]) -> syn::Result<EntityAttr> {
    let mut out = EntityAttr::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("searchable")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("entity") {
                out.entity = Some(meta.value()?.parse()?);
                Ok(())
            } else if meta.path.is_ident("table") {
                out.table = Some(meta.value()?.parse()?);
                Ok(())
            } else {
                Err(meta.error("expected `entity` or `table`"))
            }
        })?;
    }
    Ok(out)
}

/// `Ok(None)` when the field carries no `#[searchable]` attribute at all.
fn parse_field_attr(attrs: &[Attribute]) -> syn::Result<Option<FieldAttr>> {
    let mut found = None;
    for attr in attrs.iter().filter(|a| a.path().is_ident("searchable")) {
        let out = found.get_or_insert_with(FieldAttr::default);
        // Bare `#[searchable]` takes every default.
        if matches!(attr.meta, syn::Meta::Path(_)) {
            continue;
        }
        attr.parse_nested_meta(|meta| parse_field_key(out, &meta))?;
    }
    Ok(found)
}

fn parse_field_key(out: &mut FieldAttr, meta: &ParseNestedMeta<'_>) -> syn::Result<()> {
    let path = &meta.path;
    if path.is_ident("flatten") {
        out.flatten = true;
    } else if path.is_ident("name") {
        out.name = Some(meta.value()?.parse()?);
    } else if path.is_ident("display_name") {
        out.display_name = Some(meta.value()?.parse()?);
    } else if path.is_ident("field_type") {
        let lit: LitStr = meta.value()?.parse()?;
        let variant = match lit.value().as_str() {
            "string" => quote!(String),
            "integer" => quote!(Integer),
            "date_string" => quote!(DateString),
            "boolean" => quote!(Boolean),
            _ => {
                return Err(syn::Error::new_spanned(
                    lit,
                    "expected \"string\", \"integer\", \"date_string\" or \"boolean\"",
                ));
            }
        };
        out.field_type = Some(quote!(::sift_sdk::FieldType::#variant));
    } else if path.is_ident("searchable") {
        out.searchable = Some(meta.value()?.parse()?);
    } else if path.is_ident("filterable") {
        out.filterable = Some(meta.value()?.parse()?);
    } else if path.is_ident("sortable") {
        out.sortable = Some(meta.value()?.parse()?);
    } else if path.is_ident("value_source") {
        let lit: LitStr = meta.value()?.parse()?;
        let variant = match lit.value().as_str() {
            "database" => quote!(Database),
            "enum" => quote!(Enum),
            _ => {
                return Err(syn::Error::new_spanned(
                    lit,
                    "expected \"database\" or \"enum\"",
                ));
            }
        };
        out.value_source = Some(quote!(::sift_sdk::ValueSourceType::#variant));
    } else if path.is_ident("enum_class") {
        out.enum_class = Some(meta.value()?.parse()?);
    } else if path.is_ident("synonyms") {
        let array: ExprArray = meta.value()?.parse()?;
        for elem in array.elems {
            match elem {
                Expr::Lit(syn::ExprLit {
                    lit: Lit::Str(s), ..
                }) => out.synonyms.push(s),
                other => {
                    return Err(syn::Error::new_spanned(other, "synonyms must be strings"));
                }
            }
        }
    } else {
        return Err(meta.error("unknown searchable key"));
    }
    Ok(())
}

fn capability_tokens(attr: FieldAttr) -> TokenStream2 {
    let mut assignments = Vec::new();

    if let Some(name) = attr.name {
        assignments.push(quote!(name: ::std::option::Option::Some(#name)));
    }
    if let Some(display_name) = attr.display_name {
        assignments.push(quote!(display_name: ::std::option::Option::Some(#display_name)));
    }
    if let Some(field_type) = attr.field_type {
        assignments.push(quote!(field_type: #field_type));
    }
    if let Some(searchable) = attr.searchable {
        assignments.push(quote!(searchable: #searchable));
    }
    if let Some(filterable) = attr.filterable {
        assignments.push(quote!(filterable: #filterable));
    }
    if let Some(sortable) = attr.sortable {
        assignments.push(quote!(sortable: #sortable));
    }

    // An enum class without an explicit source implies the ENUM source.
    let value_source = match (attr.value_source, &attr.enum_class) {
        (Some(source), _) => Some(source),
        (None, Some(_)) => Some(quote!(::sift_sdk::ValueSourceType::Enum)),
        (None, None) => None,
    };
    if let Some(source) = value_source {
        assignments.push(quote!(value_source: #source));
    }
    if let Some(enum_class) = attr.enum_class {
        assignments.push(quote! {
            enum_class: ::std::option::Option::Some(::sift_sdk::EnumClass::of::<#enum_class>())
        });
    }
    if !attr.synonyms.is_empty() {
        let synonyms = attr.synonyms;
        assignments.push(quote!(synonyms: &[#(#synonyms),*]));
    }

    quote! {
        ::sift_sdk::FieldCapability {
            #(#assignments,)*
            ..::sift_sdk::FieldCapability::DEFAULT
        }
    }
}

// ---------------------------------------------------------------------------
// ClosedSet
// ---------------------------------------------------------------------------

fn expand_closed_set(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let Data::Enum(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "ClosedSet can only be derived for enums",
        ));
    };

    let mut names = Vec::new();
    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "ClosedSet variants must be unit variants",
            ));
        }

        let mut rename = None;
        for attr in variant.attrs.iter().filter(|a| a.path().is_ident("closed_set")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") {
                    rename = Some(meta.value()?.parse::<LitStr>()?);
                    Ok(())
                } else {
                    Err(meta.error("expected `rename`"))
                }
            })?;
        }

        let name = rename.unwrap_or_else(|| {
            LitStr::new(
                &screaming_snake_case(&variant.ident.unraw().to_string()),
                Span::call_site(),
            )
        });
        names.push(name);
    }

    let ident = &input.ident;
    let type_name = ident.unraw().to_string();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::sift_sdk::ClosedSet for #ident #ty_generics #where_clause {
            const NAME: &'static str = #type_name;
            const VARIANTS: &'static [&'static str] = &[#(#names),*];
        }
    })
}

/// `JeeAdvanced` → `JEE_ADVANCED`, splitting words exactly like serde's
/// `rename_all = "SCREAMING_SNAKE_CASE"`: an underscore before every
/// uppercase char except the first.
fn screaming_snake_case(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len() + 4);
    for (i, c) in ident.char_indices() {
        if i > 0 && c.is_uppercase() {
            out.push('_');
        }
        out.extend(c.to_uppercase());
    }
    out
}
