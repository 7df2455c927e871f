use darling::util::PathList;
use darling::{FromDeriveInput, FromField};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, DeriveInput, Type};

#[derive(FromDeriveInput)]
#[darling(attributes(injectable), supports(struct_any))]
struct InjectableOpts {
    ident: syn::Ident,
    generics: syn::Generics,
    data: darling::ast::Data<(), InjectableField>,
    #[darling(default)]
    transient: bool,
    #[darling(default)]
    defaultable: bool,
    #[darling(default)]
    implements: PathList,
}

#[derive(FromField)]
struct InjectableField {
    ident: Option<syn::Ident>,
    ty: Type,
}

pub fn derive_injectable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let opts = match InjectableOpts::from_derive_input(&input) {
        Ok(opts) => opts,
        Err(err) => return err.write_errors().into(),
    };
    if let Err(err) = validate(&opts) {
        return err.write_errors().into();
    }
    TokenStream::from(generate_injectable_impl(&opts))
}

/// Option combinations the container cannot honor are rejected here rather
/// than silently ignored at resolution time.
fn validate(opts: &InjectableOpts) -> darling::Result<()> {
    // Override registration runs once, when the cached single is first
    // constructed. A transient type is never cached, so its implements(...)
    // declaration would never take effect.
    if opts.transient && !opts.implements.is_empty() {
        return Err(darling::Error::custom(
            "#[injectable(transient)] cannot be combined with implements(...): \
             overrides are registered when the cached single is first constructed, \
             and transient types are never cached",
        )
        .with_span(&opts.ident));
    }
    Ok(())
}

/// How one field wants its dependency delivered.
enum Delivery {
    /// `Lazy<T>`: a deferred handle, resolved on first use.
    Lazy(Type),
    /// `Arc<dyn Trait>`: the most recent override of the trait.
    TraitShared(Type),
    /// `Arc<T>`: a shared handle to the cached single.
    Shared(Type),
    /// Plain `T`: an owned value constructed fresh.
    Value(Type),
}

fn classify_field(ty: &Type) -> Delivery {
    if let Some(inner) = single_generic_arg(ty, "Lazy") {
        return Delivery::Lazy(inner);
    }
    if let Some(inner) = single_generic_arg(ty, "Arc") {
        return if matches!(inner, Type::TraitObject(_)) {
            Delivery::TraitShared(inner)
        } else {
            Delivery::Shared(inner)
        };
    }
    Delivery::Value(ty.clone())
}

/// Inner type of `Wrapper<T>` if `ty`'s last path segment is `Wrapper`.
fn single_generic_arg(ty: &Type, wrapper: &str) -> Option<Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    if segment.ident != wrapper {
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

fn generate_injectable_impl(opts: &InjectableOpts) -> TokenStream2 {
    let struct_name = &opts.ident;
    let (impl_generics, ty_generics, where_clause) = opts.generics.split_for_impl();

    let fields = opts
        .data
        .as_ref()
        .take_struct()
        .map(|s| s.fields)
        .unwrap_or_default();

    let cached = !opts.transient;
    let defaultable = opts.defaultable;

    let inject_body = if defaultable {
        quote! {
            let _ = container;
            Ok(<Self as ::core::default::Default>::default())
        }
    } else if fields.is_empty() {
        quote! {
            let _ = container;
            Err(::spindle::SpindleError::NotConstructible {
                type_name: ::std::any::type_name::<Self>().to_string(),
                reason: "type has no dependencies to inject; mark it #[injectable(defaultable)]"
                    .to_string(),
            })
        }
    } else {
        let resolutions = fields.iter().map(|field| {
            let expr = field_resolution(&field.ty);
            match &field.ident {
                Some(ident) => quote! { #ident: #expr },
                None => expr,
            }
        });
        if fields[0].ident.is_some() {
            quote! { Ok(Self { #(#resolutions),* }) }
        } else {
            quote! { Ok(Self( #(#resolutions),* )) }
        }
    };

    let descriptors = if defaultable {
        Vec::new()
    } else {
        fields
            .iter()
            .map(|field| match classify_field(&field.ty) {
                Delivery::Lazy(inner) => quote! { ::spindle::Descriptor::lazy::<#inner>() },
                Delivery::TraitShared(inner) | Delivery::Shared(inner) => {
                    quote! { ::spindle::Descriptor::shared::<#inner>() }
                }
                Delivery::Value(inner) => quote! { ::spindle::Descriptor::value::<#inner>() },
            })
            .collect::<Vec<_>>()
    };

    let override_registrations = opts.implements.iter().map(|path| {
        quote! {
            container.register_override_instance::<dyn #path>(
                ::spindle::TypeKey::of::<Self>(),
                ::std::sync::Arc::clone(instance) as ::std::sync::Arc<dyn #path>,
            );
        }
    });

    quote! {
        impl #impl_generics ::spindle::Injectable for #struct_name #ty_generics #where_clause {
            const CACHED: bool = #cached;
            const EMPTY_INJECTABLE: bool = #defaultable;

            fn inject(
                container: &::spindle::Container
            ) -> ::spindle::Result<Self> {
                #inject_body
            }

            fn dependencies() -> ::std::vec::Vec<::spindle::Descriptor> {
                ::std::vec![#(#descriptors),*]
            }

            fn register_overrides(
                container: &::spindle::Container,
                instance: &::std::sync::Arc<Self>,
            ) {
                let _ = (container, instance);
                #(#override_registrations)*
            }
        }
    }
}

fn field_resolution(ty: &Type) -> TokenStream2 {
    match classify_field(ty) {
        Delivery::Lazy(_) => quote! { ::spindle::Lazy::new(container) },
        Delivery::TraitShared(inner) => quote! { container.resolve_override::<#inner>()? },
        Delivery::Shared(inner) => quote! { container.resolve::<#inner>()? },
        Delivery::Value(inner) => quote! { container.construct::<#inner>()? },
    }
}
