use proc_macro::TokenStream;
use quote::quote;
use syn::{
    Attribute, Data, DeriveInput, Error, Field, Fields, Ident, LitInt, Result, Token,
    ext::IdentExt,
    parse::{Parse, ParseStream},
};

pub(crate) fn expand_to_record(input: &DeriveInput) -> Result<TokenStream> {
    let Data::Struct(data) = &input.data else {
        Err(Error::new_spanned(
            input,
            "`ToRecord` may only be derived on structs.",
        ))?
    };

    let Fields::Named(fields) = &data.fields else {
        Err(Error::new_spanned(
            input,
            "`ToRecord` may only be derived on structs with named fields.",
        ))?
    };

    let Some(attr) = input.attrs.iter().find(|a| a.path().is_ident("message")) else {
        Err(Error::new_spanned(
            &input.ident,
            "`ToRecord` requires a `#[message(global = N, local = M)]` attribute.",
        ))?
    };

    let MessageAttribute { global, local } = MessageAttribute::parse(attr)?;

    let fields = fields
        .named
        .iter()
        .map(FieldMetadata::parse)
        .map(Result::transpose)
        .flatten() // Skip fields without an attribute.
        .collect::<Result<Vec<_>>>()?;

    let schema_fields = fields.iter().map(|field| {
        let FieldMetadata {
            key,
            number,
            variant,
            size,
            ..
        } = field;

        quote! {
            .sized_field(#key, #number, ::cassette::sans::data::BaseType::#variant, #size)
        }
    });

    let inserts = fields.iter().map(|field| {
        let FieldMetadata { name, key, .. } = field;

        quote! {
            values.insert(#key, ::core::clone::Clone::clone(&self.#name));
        }
    });

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let expanded = quote! {
        impl #impl_generics ::cassette::avec::ToRecord for #name #ty_generics #where_clause {
            fn schema() -> ::core::result::Result<
                ::cassette::schema::MessageSchema,
                ::cassette::schema::SchemaError,
            > {
                ::cassette::schema::MessageSchema::builder(#global, #local)
                    #(#schema_fields)*
                    .build()
            }

            fn values(&self) -> ::cassette::schema::Values {
                let mut values = ::cassette::schema::Values::new();
                #(#inserts)*
                values
            }
        }
    };

    Ok(expanded.into())
}

#[derive(Debug)]
struct MessageAttribute {
    global: u16,
    local: u8,
}

impl MessageAttribute {
    fn parse(attr: &Attribute) -> Result<Self> {
        let mut global = None;
        let mut local = None;

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("global") {
                let lit = meta.value()?.parse::<LitInt>()?;
                global = Some(lit.base10_parse::<u16>()?);
            } else if meta.path.is_ident("local") {
                let lit = meta.value()?.parse::<LitInt>()?;
                let number = lit.base10_parse::<u8>()?;
                if number > 15 {
                    Err(Error::new_spanned(
                        lit,
                        "Local message numbers range from 0 to 15.",
                    ))?
                }
                local = Some(number);
            } else {
                Err(meta.error("Expected `global` or `local`."))?
            }
            Ok(())
        })?;

        let Some(global) = global else {
            Err(Error::new_spanned(attr, "Missing `global` message number."))?
        };

        let Some(local) = local else {
            Err(Error::new_spanned(attr, "Missing `local` message number."))?
        };

        Ok(Self { global, local })
    }
}

#[derive(Debug)]
struct FieldMetadata {
    name: Ident,
    /// Field name as seen by the schema, without any raw identifier prefix.
    key: String,
    number: u8,
    variant: Ident,
    size: u8,
}

impl FieldMetadata {
    fn parse(field: &Field) -> Result<Option<Self>> {
        let Some(name) = field.ident.clone() else {
            Err(Error::new_spanned(field, "Field must be named."))?
        };

        let Some(attr) = field.attrs.iter().find(|a| a.path().is_ident("field")) else {
            return Ok(None);
        };

        let FieldAttribute {
            number,
            base_type,
            size,
        } = attr.meta.require_list()?.parse_args()?;

        let number = number.base10_parse::<u8>()?;
        let (variant, width) = lookup_base_type(&base_type)?;

        let size = match size {
            Some(lit) => {
                let size = lit.base10_parse::<u8>()?;
                if size == 0 || size % width != 0 {
                    Err(Error::new_spanned(
                        lit,
                        format!("Size must be a positive multiple of {width}, the width of `{base_type}`."),
                    ))?
                }
                size
            }
            None => width,
        };

        Ok(Some(Self {
            key: name.unraw().to_string(),
            name,
            number,
            variant,
            size,
        }))
    }
}

/// Find the `BaseType` variant and element width for a protocol type name.
fn lookup_base_type(ident: &Ident) -> Result<(Ident, u8)> {
    let (variant, width) = match ident.to_string().as_str() {
        "enum" => ("Enum", 1),
        "sint8" => ("Sint8", 1),
        "uint8" => ("Uint8", 1),
        "sint16" => ("Sint16", 2),
        "uint16" => ("Uint16", 2),
        "sint32" => ("Sint32", 4),
        "uint32" => ("Uint32", 4),
        "string" => ("String", 1),
        "float32" => ("Float32", 4),
        "float64" => ("Float64", 8),
        "uint8z" => ("Uint8z", 1),
        "uint16z" => ("Uint16z", 2),
        "uint32z" => ("Uint32z", 4),
        "byte" => ("Byte", 1),
        "sint64" => ("Sint64", 8),
        "uint64" => ("Uint64", 8),
        "uint64z" => ("Uint64z", 8),
        _ => Err(Error::new_spanned(ident, "Unknown base type."))?,
    };

    Ok((Ident::new(variant, ident.span()), width))
}

#[derive(Debug)]
struct FieldAttribute {
    number: LitInt,
    base_type: Ident,
    size: Option<LitInt>,
}

impl Parse for FieldAttribute {
    fn parse(input: ParseStream) -> Result<Self> {
        let number = input.parse::<LitInt>()?;
        input.parse::<Token![,]>()?;
        // Accept keywords, since `enum` names a base type.
        let base_type = Ident::parse_any(input)?;

        let size = if input.parse::<Option<Token![,]>>()?.is_some() && !input.is_empty() {
            let key = input.parse::<Ident>()?;
            if key != "size" {
                Err(Error::new_spanned(key, "Expected `size = N`."))?
            }
            input.parse::<Token![=]>()?;
            let size = input.parse::<LitInt>()?;
            input.parse::<Option<Token![,]>>()?;
            Some(size)
        } else {
            None
        };

        Ok(Self {
            number,
            base_type,
            size,
        })
    }
}
