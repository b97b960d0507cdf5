use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use polars::prelude::*;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::cell::CellValue;
use crate::column::{Align, ColumnDescriptor};
use crate::domain::GridError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Csv,
    Parquet,
    Arrow,
}

#[derive(Debug)]
pub struct FileInfo {
    pub path: PathBuf,
    pub file_size: u64,
    pub file_type: FileType,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    pub cells: Vec<CellValue>,
}

impl Record {
    pub fn get(&self, idx: usize) -> CellValue {
        self.cells.get(idx).cloned().unwrap_or_default()
    }
}

/// A loaded file: generic column descriptors over its records.
pub struct Table {
    pub name: String,
    pub columns: Vec<ColumnDescriptor<Record>>,
    pub rows: Arc<[Record]>,
}

struct LoadedColumn {
    name: String,
    numeric: bool,
    values: Vec<CellValue>,
}

pub fn detect_file_type(path: &Path) -> Result<FileType, GridError> {
    match path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_uppercase())
        .as_deref()
    {
        Some("CSV") => Ok(FileType::Csv),
        Some("PARQUET") | Some("PQ") => Ok(FileType::Parquet),
        Some("ARROW") | Some("IPC") | Some("FEATHER") => Ok(FileType::Arrow),
        _ => Err(GridError::UnknownFileType(path.to_path_buf())),
    }
}

pub fn get_file_info(path: PathBuf) -> Result<FileInfo, GridError> {
    let metadata = fs::metadata(&path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => GridError::FileNotFound(path.clone()),
        ErrorKind::PermissionDenied => GridError::PermissionDenied(path.clone()),
        _ => GridError::Io(e),
    })?;
    if !metadata.is_file() {
        return Err(GridError::LoadingFailed(format!(
            "{} is not a file",
            path.display()
        )));
    }
    let file_type = detect_file_type(&path)?;
    Ok(FileInfo {
        file_size: metadata.len(),
        path,
        file_type,
    })
}

fn load_csv(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyCsvReader::new(PlPath::Local(path.into()))
        .with_has_header(true)
        .finish()
}

fn load_parquet(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyFrame::scan_parquet(PlPath::Local(path.into()), ScanArgsParquet::default())
}

fn load_arrow(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyFrame::scan_ipc(
        PlPath::Local(path.into()),
        polars::io::ipc::IpcScanOptions,
        UnifiedScanArgs::default(),
    )
}

fn is_numeric_type(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

fn load_column(df: &DataFrame, col_name: &str) -> Result<LoadedColumn, PolarsError> {
    let column = df.column(col_name)?;
    let numeric = is_numeric_type(column.dtype());

    let values = if numeric {
        let casted = column.cast(&DataType::Float64)?;
        casted
            .f64()?
            .into_iter()
            .map(|v| v.map_or(CellValue::Empty, CellValue::Number))
            .collect()
    } else if column.dtype() == &DataType::Boolean {
        column
            .bool()?
            .into_iter()
            .map(|v| v.map_or(CellValue::Empty, CellValue::Bool))
            .collect()
    } else {
        let casted = column.cast(&DataType::String)?;
        casted
            .str()?
            .into_iter()
            .map(|v| match v {
                Some(s) => CellValue::Text(s.replace("\r\n", " ↵ ").replace('\n', " ↵ ")),
                None => CellValue::Empty,
            })
            .collect()
    };

    Ok(LoadedColumn {
        name: col_name.to_string(),
        numeric,
        values,
    })
}

/// Turn a data frame into records plus one sortable descriptor per column.
/// Numeric columns are right aligned.
pub fn from_frame(name: impl Into<String>, df: &DataFrame) -> Result<Table, GridError> {
    // One rayon task per column.
    let loaded: Result<Vec<LoadedColumn>, _> = df
        .get_column_names()
        .par_iter()
        .map(|name| load_column(df, name))
        .collect();
    let loaded = loaded?;

    let rows: Arc<[Record]> = (0..df.height())
        .map(|r| Record {
            cells: loaded.iter().map(|c| c.values[r].clone()).collect(),
        })
        .collect();

    let columns = loaded
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            let align = if column.numeric {
                Align::Right
            } else {
                Align::Left
            };
            ColumnDescriptor::new(column.name.clone(), column.name.clone(), move |r: &Record| {
                r.get(idx)
            })
            .align(align)
            .sortable(true)
        })
        .collect();

    Ok(Table {
        name: name.into(),
        columns,
        rows,
    })
}

pub fn load_data_file(path: PathBuf) -> Result<Table, GridError> {
    let file_info = get_file_info(path)?;
    let frame = match file_info.file_type {
        FileType::Csv => load_csv(&file_info.path)?,
        FileType::Parquet => load_parquet(&file_info.path)?,
        FileType::Arrow => load_arrow(&file_info.path)?,
    };
    debug!(
        "Loading {:?} ({} bytes) as {:?}",
        file_info.path, file_info.file_size, file_info.file_type
    );

    let start_time = Instant::now();
    let df = frame.collect()?;
    let name = file_info
        .path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("???")
        .to_string();
    let table = from_frame(name, &df)?;
    info!(
        "Loaded {} rows x {} columns in {}ms",
        table.rows.len(),
        table.columns.len(),
        start_time.elapsed().as_millis()
    );
    Ok(table)
}
