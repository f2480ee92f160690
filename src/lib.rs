// src/lib.rs - Library interface for hypha_morph

pub mod branch_tracer;
pub mod config;
pub mod error_function;
pub mod errors;
pub mod hyphal_metrics;
pub mod image_io;
pub mod output;
pub mod pipeline;
pub mod pixel_classifier;
pub mod raster;
pub mod skeleton_pruner;
pub mod statistics;

// Re-export commonly used types and functions
pub use errors::{HyphaError, Result};
pub use config::Config;
pub use pipeline::{process_image, ImageResult};
pub use image_io::{InputImage, load_image, save_image};
pub use raster::{BinaryRaster, Coord, Polarity, Region};

// Re-export the skeleton engine
pub use pixel_classifier::{
    branch_point,
    can_remove,
    is_dense_junction,
    is_endpoint,
    BranchStep,
};

pub use branch_tracer::{
    path_search,
    BranchTracer,
    Termination,
    Trace,
    TraceStep,
};

pub use skeleton_pruner::{
    decompose,
    prune_points,
    Branch,
    LoopRemoval,
    PruneOptions,
    PruneReport,
    SkeletonPruner,
};

pub use hyphal_metrics::{
    analyse,
    analyse_with_style,
    Analysis,
    HyphalMetrics,
    OverlayStyle,
};

// Re-export statistics
pub use statistics::DescriptiveStatistics;
pub use error_function::{erf, erf_inv, inverse_normal_cdf, z_value};
