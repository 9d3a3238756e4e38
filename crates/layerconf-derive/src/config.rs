use darling::{FromDeriveInput, FromField};
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{DeriveInput, Generics, Ident};

/// Container-level view of a `#[derive(Config)]` input.
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(config), supports(struct_named))]
struct ConfigOpts {
    ident: Ident,
    generics: Generics,
    data: darling::ast::Data<(), FieldOpts>,
}

/// Field-level attributes for `#[config(...)]`
#[derive(Debug, FromField)]
#[darling(attributes(config))]
struct FieldOpts {
    ident: Option<Ident>,

    /// Source key the value is stored under
    #[darling(default)]
    key: Option<String>,

    /// Explicit primary namespace (resolver default when absent)
    #[darling(default)]
    namespace: Option<String>,

    /// Namespace merged on top of the primary value
    #[darling(default)]
    override_namespace: Option<String>,

    /// Comma separated rule string
    #[darling(default)]
    validate: Option<String>,

    /// Merge may not overwrite this field
    #[darling(default)]
    readonly: bool,

    /// Excluded from merge, zero checks and walking
    #[darling(default)]
    skip: bool,
}

impl FieldOpts {
    fn ident(&self) -> &Ident {
        self.ident
            .as_ref()
            .expect("darling only accepts structs with named fields")
    }

    /// Name used in merge error paths: the source key, or the field name.
    fn path_segment(&self) -> String {
        self.key
            .clone()
            .unwrap_or_else(|| self.ident().to_string())
    }

    fn rules(&self) -> &str {
        self.validate.as_deref().unwrap_or("")
    }

    fn is_required(&self) -> bool {
        self.rules().split(',').any(|tag| tag.trim() == "required")
    }

    fn check(&self) -> darling::Result<()> {
        let ident = self.ident();
        if self.skip
            && (self.key.is_some()
                || self.readonly
                || self.validate.is_some()
                || self.namespace.is_some()
                || self.override_namespace.is_some())
        {
            return Err(
                darling::Error::custom("`skip` cannot be combined with other config attributes")
                    .with_span(ident),
            );
        }
        if self.key.as_deref() == Some("") {
            return Err(darling::Error::custom("`key` must not be empty").with_span(ident));
        }
        if self.key.is_none()
            && (self.namespace.is_some()
                || self.override_namespace.is_some()
                || self.validate.is_some())
        {
            return Err(darling::Error::custom(
                "`namespace`, `override_namespace` and `validate` require a `key`",
            )
            .with_span(ident));
        }
        Ok(())
    }
}

pub fn generate_impl(input: &DeriveInput) -> TokenStream2 {
    match ConfigOpts::from_derive_input(input).and_then(validate_opts) {
        Ok(opts) => generate_from_opts(opts),
        Err(e) => e.write_errors(),
    }
}

fn validate_opts(opts: ConfigOpts) -> darling::Result<ConfigOpts> {
    let mut errors = darling::Error::accumulator();
    if !opts.generics.params.is_empty() {
        errors.push(
            darling::Error::custom("`Config` cannot be derived for generic structs")
                .with_span(&opts.generics),
        );
    }
    if let darling::ast::Data::Struct(fields) = &opts.data {
        for field in fields.iter() {
            errors.handle(field.check());
        }
    }
    errors.finish()?;
    Ok(opts)
}

fn generate_from_opts(opts: ConfigOpts) -> TokenStream2 {
    let fields = match opts.data {
        darling::ast::Data::Struct(fields) => fields.fields,
        // `supports(struct_named)` rejects everything else before we get here.
        darling::ast::Data::Enum(_) => return TokenStream2::new(),
    };

    let struct_name = &opts.ident;
    let keyed: Vec<&FieldOpts> = fields.iter().filter(|f| f.key.is_some()).collect();

    let schema = generate_schema(&keyed);
    let walk = generate_walk(&keyed);
    let merge = generate_merge(&fields);

    let zero_checks = fields.iter().filter(|f| !f.skip).map(|f| {
        let ident = f.ident();
        quote! { && ::layerconf::IsZero::is_zero(&self.#ident) }
    });

    quote! {
        impl ::layerconf::Schema for #struct_name {
            #schema
        }

        impl ::layerconf::Walk for #struct_name {
            #walk
        }

        impl ::layerconf::Merge for #struct_name {
            const STRUCTURAL: bool = true;

            #merge
        }

        impl ::layerconf::IsZero for #struct_name {
            fn is_zero(&self) -> bool {
                true #(#zero_checks)*
            }
        }

        impl ::layerconf::ConfigValue for #struct_name {
            fn kind(&self) -> ::layerconf::ValueKind {
                ::layerconf::ValueKind::Struct
            }

            fn as_walk_mut(&mut self) -> ::core::option::Option<&mut dyn ::layerconf::Walk> {
                ::core::option::Option::Some(self)
            }

            fn as_any(&self) -> ::core::option::Option<&dyn ::core::any::Any> {
                ::core::option::Option::Some(self)
            }
        }
    }
}

fn optional_str(value: &Option<String>) -> TokenStream2 {
    match value {
        Some(value) => quote! { ::core::option::Option::Some(#value) },
        None => quote! { ::core::option::Option::None },
    }
}

fn generate_schema(keyed: &[&FieldOpts]) -> TokenStream2 {
    let count = keyed.len();
    let entries = keyed.iter().map(|f| {
        let key = f.key.as_deref().unwrap_or_default();
        let namespace = optional_str(&f.namespace);
        let override_namespace = optional_str(&f.override_namespace);
        let required = f.is_required();
        let rules = f.rules();
        quote! {
            ::layerconf::FieldDescriptor::new(#key, #namespace, #override_namespace, #required, #rules)
        }
    });

    let resolve_body = if keyed.is_empty() {
        quote! { let _ = fields; }
    } else {
        let calls = keyed.iter().enumerate().map(|(index, f)| {
            let ident = f.ident();
            quote! { fields.resolve(&descriptors[#index], &mut self.#ident)?; }
        });
        quote! {
            let descriptors = <Self as ::layerconf::Schema>::descriptors();
            #(#calls)*
        }
    };

    quote! {
        fn descriptors() -> &'static [::layerconf::FieldDescriptor] {
            static DESCRIPTORS: [::layerconf::FieldDescriptor; #count] = [
                #(#entries),*
            ];
            &DESCRIPTORS
        }

        fn resolve_fields(
            &mut self,
            fields: &mut ::layerconf::FieldResolver<'_>,
        ) -> ::layerconf::Result<()> {
            #resolve_body
            ::core::result::Result::Ok(())
        }
    }
}

fn generate_walk(keyed: &[&FieldOpts]) -> TokenStream2 {
    let visits = keyed.iter().map(|f| {
        let ident = f.ident();
        let key = f.key.as_deref().unwrap_or_default();
        let rules = f.rules();
        quote! {
            visitor.visit(&::layerconf::FieldMeta::new(#key, #rules), &mut self.#ident);
        }
    });

    let body = if keyed.is_empty() {
        quote! { let _ = visitor; }
    } else {
        quote! { #(#visits)* }
    };

    quote! {
        fn walk(&mut self, visitor: &mut dyn ::layerconf::FieldVisitor) {
            #body
        }
    }
}

fn generate_merge(fields: &[FieldOpts]) -> TokenStream2 {
    let merged = fields.iter().map(|f| {
        let ident = f.ident();
        let path = f.path_segment();
        if f.skip {
            quote! { #ident: ::core::clone::Clone::clone(&self.#ident) }
        } else if f.readonly {
            quote! {
                #ident: {
                    if !::layerconf::IsZero::is_zero(&overlay.#ident) && overlay.#ident != self.#ident {
                        return ::core::result::Result::Err(
                            ::layerconf::MergeError::FieldNotAssignable { path: #path.to_string() },
                        );
                    }
                    ::core::clone::Clone::clone(&self.#ident)
                }
            }
        } else {
            quote! {
                #ident: ::layerconf::Merge::merge(&self.#ident, &overlay.#ident)
                    .map_err(|err| err.within(#path))?
            }
        }
    });

    quote! {
        fn merge(&self, overlay: &Self) -> ::core::result::Result<Self, ::layerconf::MergeError> {
            ::core::result::Result::Ok(Self {
                #(#merged),*
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn expand(input: DeriveInput) -> String {
        generate_impl(&input).to_string()
    }

    #[test]
    fn keyed_fields_become_descriptors() {
        let output = expand(parse_quote! {
            struct Stack {
                #[config(key = "digital_ocean", override_namespace = "esc", validate = "required , oneof=a b")]
                digital_ocean: Region,
                internal: u32,
            }
        });

        assert!(output.contains("FieldDescriptor :: new"), "got: {output}");
        assert!(output.contains("\"digital_ocean\""));
        assert!(output.contains("\"esc\""));
        assert!(output.contains("true"));
        assert!(!output.contains("compile_error"));
    }

    #[test]
    fn required_flag_matches_whole_tags_only() {
        let field = |rules: &str| FieldOpts {
            ident: Some(parse_quote!(field)),
            key: Some("field".into()),
            namespace: None,
            override_namespace: None,
            validate: Some(rules.into()),
            readonly: false,
            skip: false,
        };

        assert!(field("omitempty, required").is_required());
        assert!(!field("required_if=x").is_required());
        assert!(!field("").is_required());
    }

    #[test]
    fn skip_with_key_is_rejected() {
        let output = expand(parse_quote! {
            struct Stack {
                #[config(key = "cache", skip)]
                cache: Vec<u8>,
            }
        });
        assert!(output.contains("compile_error"), "got: {output}");
    }

    #[test]
    fn validate_without_key_is_rejected() {
        let output = expand(parse_quote! {
            struct Stack {
                #[config(validate = "required")]
                region: String,
            }
        });
        assert!(output.contains("compile_error"), "got: {output}");
    }

    #[test]
    fn generic_structs_are_rejected() {
        let output = expand(parse_quote! {
            struct Pool<T> {
                #[config(key = "retries")]
                retries: Option<T>,
            }
        });
        assert!(output.contains("compile_error"), "got: {output}");
        assert!(output.contains("generic"), "got: {output}");
        assert!(!output.contains("impl :: layerconf"), "got: {output}");
    }

    #[test]
    fn lifetime_parameters_are_rejected() {
        let output = expand(parse_quote! {
            struct Borrowed<'a> {
                #[config(key = "name")]
                name: &'a str,
            }
        });
        assert!(output.contains("compile_error"), "got: {output}");
    }

    #[test]
    fn nested_structs_merge_structurally() {
        let output = expand(parse_quote! {
            struct Pool {
                #[config(key = "retries")]
                retries: Option<u32>,
            }
        });
        assert!(output.contains("const STRUCTURAL : bool = true"), "got: {output}");
        assert!(output.contains("fn as_any"), "got: {output}");
    }

    #[test]
    fn enums_are_rejected() {
        let output = expand(parse_quote! {
            enum Region { East, West }
        });
        assert!(output.contains("compile_error"), "got: {output}");
    }
}
