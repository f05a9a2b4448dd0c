use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GridError {
    OutOfBounds { x: f32, y: f32 },
    DepthExhausted { x: f32, y: f32 },
    NotFound { x: f32, y: f32 },
    InvalidCellSize { width: f32, height: f32 },
    InvalidGridDims { cols: u32, rows: u32 },
    InvalidCapacity,
}

pub type GridResult<T> = Result<T, GridError>;

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridError::OutOfBounds { x, y } => {
                write!(f, "position lies outside the indexed area (x: {}, y: {})", x, y)
            }
            GridError::DepthExhausted { x, y } => {
                write!(
                    f,
                    "cell at maximum split depth is full and cannot take another handle (x: {}, y: {})",
                    x, y
                )
            }
            GridError::NotFound { x, y } => {
                write!(
                    f,
                    "handle is not resident in the cell containing (x: {}, y: {})",
                    x, y
                )
            }
            GridError::InvalidCellSize { width, height } => {
                write!(
                    f,
                    "macro cell size must be finite and positive (width: {}, height: {})",
                    width, height
                )
            }
            GridError::InvalidGridDims { cols, rows } => {
                write!(
                    f,
                    "grid dimensions must be non-zero (cols: {}, rows: {})",
                    cols, rows
                )
            }
            GridError::InvalidCapacity => {
                write!(f, "leaf capacity must be non-zero")
            }
        }
    }
}

impl std::error::Error for GridError {}
