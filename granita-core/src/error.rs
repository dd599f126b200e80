//! Error types for the granita core library.
//!
//! Each module owns a focused error enum; this module folds them into the
//! top-level [`GranitaError`] with stable machine-readable codes and exposes
//! the crate's result alias.

use std::fmt;

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::counts::BoundsError;
use crate::generator::GrowthError;
use crate::graph::GraphError;
use crate::model::ModelError;
use crate::sampler::SampleError;

macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident $( ( $($pattern:tt)* ) )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(Self::$ErrVariant $( ( $($pattern)* ) )? => $CodeTy::$CodeVariant,)+
                }
            }
        }
    };
}

/// Top-level error produced by the granita core API.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum GranitaError {
    /// A graph was malformed or mutated illegally.
    #[error(transparent)]
    Graph(#[from] GraphError),
    /// A graphlet order or subgraph was outside the catalog's domain.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    /// Frequency bounds were malformed.
    #[error(transparent)]
    Bounds(#[from] BoundsError),
    /// Sampling parameters were malformed.
    #[error(transparent)]
    Sample(#[from] SampleError),
    /// Generation parameters were malformed.
    #[error(transparent)]
    Growth(#[from] GrowthError),
    /// A baseline model could not produce a graph.
    #[error(transparent)]
    Model(#[from] ModelError),
}

define_error_codes! {
    /// Stable codes describing [`GranitaError`] variants.
    enum GranitaErrorCode for GranitaError {
        /// A graph was malformed or mutated illegally.
        Graph => Graph(..) => "GRANITA_GRAPH",
        /// A graphlet order or subgraph was outside the catalog's domain.
        Catalog => Catalog(..) => "GRANITA_CATALOG",
        /// Frequency bounds were malformed.
        Bounds => Bounds(..) => "GRANITA_BOUNDS",
        /// Sampling parameters were malformed.
        Sample => Sample(..) => "GRANITA_SAMPLE",
        /// Generation parameters were malformed.
        Growth => Growth(..) => "GRANITA_GROWTH",
        /// A baseline model could not produce a graph.
        Model => Model(..) => "GRANITA_MODEL",
    }
}

/// Convenient alias for results returned by the core API.
pub type Result<T> = core::result::Result<T, GranitaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable_per_variant() {
        let err = GranitaError::from(GraphError::SelfLoop { node: 1 });
        assert_eq!(err.code(), GranitaErrorCode::Graph);
        assert_eq!(err.code().as_str(), "GRANITA_GRAPH");

        let err = GranitaError::from(CatalogError::UnsupportedOrder { got: 6 });
        assert_eq!(err.code().to_string(), "GRANITA_CATALOG");
    }

    #[test]
    fn transparent_messages_surface_the_inner_error() {
        let err = GranitaError::from(GraphError::SelfLoop { node: 3 });
        assert_eq!(err.to_string(), "self-loop on node 3 is not allowed");
    }
}
