//! Procedural macros for Horizon Weave objects.
//!
//! This crate provides the `#[derive(Object)]` macro, which implements the
//! `Object` trait from a struct's `#[property]` fields and its `#[object]`
//! capability list.
//!
//! # Attributes
//!
//! ## `#[property]`
//!
//! Marks a `Property<T>` field as configurable. The configuration key is
//! the field name unless renamed:
//!
//! ```ignore
//! #[derive(Object, Default)]
//! struct Worker {
//!     #[property]
//!     log: Property<Option<ObjectRef>>,
//!
//!     #[property(name = "max-jobs")]
//!     max_jobs: Property<u32>,
//!
//!     started: AtomicBool,
//! }
//! ```
//!
//! Property attributes:
//! - `name = "key"`: Configuration key to accept instead of the field name
//! - `skip`: Leaves the field out of the generated setter
//!
//! Values are converted with `FromPropertyValue` for the property's inner
//! type.
//!
//! ## `#[object]`
//!
//! Struct-level attribute listing the capabilities the type implements.
//! Each one generates the matching `as_*` accessor, so the type must also
//! implement the trait:
//!
//! | Flag              | Trait             |
//! |-------------------|-------------------|
//! | `service`         | `Service`         |
//! | `receiver`        | `MessageReceiver` |
//! | `router`          | `MessageRouter`   |
//! | `configurable`    | `Configurable`    |
//! | `container_aware` | `ContainerAware`  |
//! | `context_aware`   | `ContextAware`    |
//! | `factory`         | `ObjectFactory`   |
//!
//! ```ignore
//! #[derive(Object, Default)]
//! #[object(service, receiver)]
//! struct Scheduler {
//!     // ...
//! }
//! ```
//!
//! Unless `no_factory` is given, the derive also adds
//! `fn class_entry() -> ClassEntry` building the type with `Default`.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    parse_macro_input, Attribute, Data, DeriveInput, Expr, ExprLit, Field, Fields, Ident, Lit,
    LitStr, Type,
};

/// Derive the `Object` trait.
///
/// This macro generates:
/// - `set_property`, assigning each `#[property]` field by configuration key
/// - `property_names`, listing those keys
/// - an `as_*` accessor for each capability flag in `#[object(...)]`
/// - `class_entry()`, unless `#[object(no_factory)]`
///
/// # Example
///
/// ```ignore
/// use horizon_weave::prelude::*;
///
/// #[derive(Object, Default)]
/// #[object(receiver)]
/// struct Label {
///     #[property]
///     text: Property<String>,
/// }
///
/// impl MessageReceiver for Label {
///     fn receive_message(&self, message: &Message, _sender: Option<&dyn Object>) -> bool {
///         if !message.has_name("clear") {
///             return false;
///         }
///         self.text.set_silent(String::new());
///         true
///     }
/// }
/// ```
#[proc_macro_derive(Object, attributes(object, property))]
pub fn derive_object(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match impl_derive_object(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Parsed property information.
struct PropertyInfo {
    field_name: Ident,
    key: String,
    inner_type: Type,
}

/// Parsed struct-level object attributes.
#[derive(Default)]
struct ObjectAttrs {
    no_factory: bool,
    service: bool,
    receiver: bool,
    router: bool,
    configurable: bool,
    container_aware: bool,
    context_aware: bool,
    factory: bool,
}

fn impl_derive_object(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let object_attrs = parse_object_attrs(&input.attrs)?;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => fields.named.iter().collect::<Vec<_>>(),
            Fields::Unit => Vec::new(),
            Fields::Unnamed(_) => {
                return Err(syn::Error::new_spanned(
                    input,
                    "Object derive only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "Object derive only supports structs",
            ));
        }
    };

    let mut properties = Vec::new();
    for field in fields {
        if let Some(prop_info) = parse_property_field(field)? {
            if properties.iter().any(|p: &PropertyInfo| p.key == prop_info.key) {
                return Err(syn::Error::new_spanned(
                    field,
                    format!("duplicate property key `{}`", prop_info.key),
                ));
            }
            properties.push(prop_info);
        }
    }

    let set_property = generate_set_property(&properties);
    let property_names = generate_property_names(&properties);
    let accessors = generate_accessors(&object_attrs);

    let factory = if object_attrs.no_factory {
        quote! {}
    } else {
        quote! {
            impl #impl_generics #struct_name #ty_generics #where_clause {
                /// Constructors for registering this type with a container.
                pub fn class_entry() -> horizon_weave_core::ClassEntry
                where
                    Self: Default,
                {
                    horizon_weave_core::ClassEntry::of_default::<Self>()
                }
            }
        }
    };

    Ok(quote! {
        impl #impl_generics horizon_weave_core::Object for #struct_name #ty_generics #where_clause {
            #set_property
            #property_names
            #accessors
        }

        #factory
    })
}

fn parse_object_attrs(attrs: &[Attribute]) -> syn::Result<ObjectAttrs> {
    let mut result = ObjectAttrs::default();

    for attr in attrs {
        if !attr.path().is_ident("object") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            let flag = if meta.path.is_ident("no_factory") {
                &mut result.no_factory
            } else if meta.path.is_ident("service") {
                &mut result.service
            } else if meta.path.is_ident("receiver") {
                &mut result.receiver
            } else if meta.path.is_ident("router") {
                &mut result.router
            } else if meta.path.is_ident("configurable") {
                &mut result.configurable
            } else if meta.path.is_ident("container_aware") {
                &mut result.container_aware
            } else if meta.path.is_ident("context_aware") {
                &mut result.context_aware
            } else if meta.path.is_ident("factory") {
                &mut result.factory
            } else {
                return Err(meta.error("unknown object attribute"));
            };
            *flag = true;
            Ok(())
        })?;
    }

    Ok(result)
}

/// Parse a field with a #[property] attribute.
fn parse_property_field(field: &Field) -> syn::Result<Option<PropertyInfo>> {
    let Some(field_name) = field.ident.clone() else {
        return Ok(None);
    };

    let mut key = None;
    let mut has_property_attr = false;
    let mut skip = false;

    for attr in &field.attrs {
        if !attr.path().is_ident("property") {
            continue;
        }
        has_property_attr = true;

        // A bare #[property] has no nested meta to parse.
        if matches!(attr.meta, syn::Meta::Path(_)) {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let value: Expr = meta.value()?.parse()?;
                match value {
                    Expr::Lit(ExprLit {
                        lit: Lit::Str(lit_str),
                        ..
                    }) => key = Some(lit_str.value()),
                    other => {
                        return Err(syn::Error::new_spanned(other, "expected a string literal"));
                    }
                }
            } else if meta.path.is_ident("skip") {
                skip = true;
            } else {
                return Err(meta.error("unknown property attribute"));
            }
            Ok(())
        })?;
    }

    if !has_property_attr || skip {
        return Ok(None);
    }

    let Some(inner_type) = extract_inner_type(&field.ty) else {
        return Err(syn::Error::new_spanned(
            &field.ty,
            "#[property] fields must have type Property<T>",
        ));
    };

    let key = key.unwrap_or_else(|| field_name.to_string());
    Ok(Some(PropertyInfo {
        field_name,
        key,
        inner_type,
    }))
}

/// Extract the inner type from Property<T>.
fn extract_inner_type(ty: &Type) -> Option<Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    if segment.ident != "Property" {
        return None;
    }
    let syn::PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first()? {
        syn::GenericArgument::Type(inner) => Some(inner.clone()),
        _ => None,
    }
}

fn generate_set_property(properties: &[PropertyInfo]) -> TokenStream2 {
    if properties.is_empty() {
        return quote! {};
    }

    let arms = properties.iter().map(|prop| {
        let field_name = &prop.field_name;
        let inner_type = &prop.inner_type;
        let key = LitStr::new(&prop.key, field_name.span());
        quote! {
            #key => {
                let value = <#inner_type as horizon_weave_core::FromPropertyValue>::from_property_value(value)?;
                self.#field_name.set_silent(value);
                Ok(())
            }
        }
    });

    quote! {
        fn set_property(
            &self,
            name: &str,
            value: horizon_weave_core::PropertyValue,
        ) -> horizon_weave_core::PropertyResult<()> {
            match name {
                #(#arms)*
                _ => Err(horizon_weave_core::PropertyError::NotFound(name.to_owned())),
            }
        }
    }
}

fn generate_property_names(properties: &[PropertyInfo]) -> TokenStream2 {
    if properties.is_empty() {
        return quote! {};
    }
    let keys = properties.iter().map(|prop| LitStr::new(&prop.key, prop.field_name.span()));
    quote! {
        fn property_names(&self) -> &'static [&'static str] {
            &[#(#keys),*]
        }
    }
}

fn generate_accessors(attrs: &ObjectAttrs) -> TokenStream2 {
    let mut accessors = TokenStream2::new();
    let flags = [
        (attrs.service, quote!(as_service), quote!(horizon_weave_core::Service)),
        (attrs.receiver, quote!(as_receiver), quote!(horizon_weave_core::MessageReceiver)),
        (attrs.router, quote!(as_router), quote!(horizon_weave_core::MessageRouter)),
        (attrs.configurable, quote!(as_configurable), quote!(horizon_weave_core::Configurable)),
        (attrs.container_aware, quote!(as_container_aware), quote!(horizon_weave_core::ContainerAware)),
        (attrs.context_aware, quote!(as_context_aware), quote!(horizon_weave_core::ContextAware)),
        (attrs.factory, quote!(as_factory), quote!(horizon_weave_core::ObjectFactory)),
    ];
    for (enabled, method, capability) in flags {
        if enabled {
            accessors.extend(quote! {
                fn #method(&self) -> Option<&dyn #capability> {
                    Some(self)
                }
            });
        }
    }
    accessors
}
