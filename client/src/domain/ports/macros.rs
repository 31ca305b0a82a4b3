//! Helper macro for declaring port error enums.
//!
//! Each generated enum derives `thiserror::Error`, gets one snake-case
//! constructor per variant (string-like fields accept `impl Into<_>`), and a
//! `kind()` accessor returning the variant name for structured log fields.

macro_rules! define_port_error {
    (@ctor $variant:ident) => {
        ::paste::paste! {
            #[doc = "Construct the `" $variant "` variant."]
            #[must_use]
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@ctor $variant:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        define_port_error!(@ctor_impl $variant () () $( $field : $ty, )*);
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) ) => {
        ::paste::paste! {
            #[doc = "Construct the `" $variant "` variant."]
            #[must_use]
            pub fn [<$variant:snake>]($($params)*) -> Self {
                Self::$variant { $($inits)* }
            }
        }
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) $field:ident : $ty:ty, $($rest:tt)*) => {
        define_port_error!(
            @ctor_impl
            $variant
            ($($params)* $field: impl Into<$ty>,)
            ($($inits)* $field: $field.into(),)
            $($rest)*
        );
    };

    (@pattern $variant:ident) => { Self::$variant };
    (@pattern $variant:ident { $($field:ident : $ty:ty),* }) => { Self::$variant { .. } };

    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $(#[doc = concat!("`", stringify!($field), "` detail.")] $field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@ctor $variant $( { $($field : $ty),* } )?);
            )*

            /// Snake-case variant name, stable enough for log fields.
            #[must_use]
            pub fn kind(&self) -> &'static str {
                match self {
                    $(
                        define_port_error!(@pattern $variant $( { $($field : $ty),* } )?) => {
                            ::paste::paste! { stringify!([<$variant:snake>]) }
                        }
                    )*
                }
            }
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    //! Regression coverage for generated constructors and kinds.
    define_port_error! {
        pub enum ExampleStorageError {
            Missing => "nothing stored",
            Io { message: String } => "storage failed: {message}",
            Rejected { status: u16, message: Option<String> } =>
                "rejected with {status}: {message:?}",
        }
    }

    #[test]
    fn unit_variants_get_plain_constructors() {
        let err = ExampleStorageError::missing();
        assert_eq!(err.to_string(), "nothing stored");
        assert_eq!(err.kind(), "missing");
    }

    #[test]
    fn string_fields_accept_borrowed_input() {
        let err = ExampleStorageError::io("disk full");
        assert_eq!(err.to_string(), "storage failed: disk full");
        assert_eq!(err.kind(), "io");
    }

    #[test]
    fn optional_fields_accept_bare_values() {
        let err = ExampleStorageError::rejected(409_u16, "taken".to_owned());
        assert_eq!(
            err,
            ExampleStorageError::Rejected {
                status: 409,
                message: Some("taken".to_owned()),
            }
        );
        assert_eq!(err.kind(), "rejected");
    }
}
