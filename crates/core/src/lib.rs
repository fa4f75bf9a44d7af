//! Slide content model, structure reconstruction and multi-dialect rendering.
//!
//! A parsed [`Deck`] goes through [`convert_deck`] (flatten, classify,
//! resolve titles, compute layout hints) into a [`ConvertedDeck`], which
//! [`render`] serializes into any [`Dialect`].

pub mod block;
pub mod classify;
pub mod columns;
pub mod config;
pub mod context;
pub mod error;
pub mod flatten;
pub mod formula;
pub mod image_hints;
pub mod layout;
pub mod media;
pub mod normalize;
pub mod pipeline;
pub mod render;
pub mod titles;
pub mod types;

pub use block::{Block, ConvertedDeck, Slide, SlideLayoutHints};
pub use config::{ConversionConfig, Dialect};
pub use context::ConversionContext;
pub use error::{Error, Result};
pub use formula::MathNode;
pub use media::{ImageStore, NoImages, PictureRequest, StoredPicture};
pub use pipeline::{convert_deck, convert_slide};
pub use render::{render, render_all};
pub use titles::TitleOutline;
pub use types::{Deck, Shape, ShapeKind, SourceSlide};
