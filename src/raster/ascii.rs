//! ESRI ascii grid text format. Rows are written from the northernmost row
//! down, the compressed variant run-length encodes each row as `countxvalue`
//! tokens and is chosen by the `.asp` file extension.

use crate::{Error, Result, COMPRESSED_ASCII_EXTENSION, NODATA};

use std::io::{BufRead, Write};
use std::path::Path;

pub fn is_compressed(path: &Path) -> bool {
    path.extension()
        .is_some_and(|e| e.eq_ignore_ascii_case(COMPRESSED_ASCII_EXTENSION))
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AsciiHeader {
    pub cols: usize,
    pub rows: usize,
    pub xll: f64,
    pub yll: f64,
    pub cell_size: f64,
}

impl AsciiHeader {
    pub fn write<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        writeln!(w, "ncols         {}", self.cols)?;
        writeln!(w, "nrows         {}", self.rows)?;
        writeln!(w, "xllcorner     {}", self.xll)?;
        writeln!(w, "yllcorner     {}", self.yll)?;
        writeln!(w, "cellsize      {}", self.cell_size)?;
        writeln!(w, "NODATA_value  {}", NODATA)
    }
}

pub fn write_row<W: Write>(w: &mut W, row: &[u8], compressed: bool) -> std::io::Result<()> {
    if compressed {
        writeln!(w, "{}", compress_row(row))
    } else {
        let values: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        writeln!(w, "{}", values.join(" "))
    }
}

/// 0 0 0 5 5 -> 3x0 2x5
pub fn compress_row(row: &[u8]) -> String {
    let mut runs: Vec<String> = Vec::new();
    let mut iter = row.iter();

    let Some(&first) = iter.next() else {
        return String::new();
    };
    let mut value = first;
    let mut count = 1;
    for &v in iter {
        if v == value {
            count += 1;
        } else {
            runs.push(format!("{count}x{value}"));
            value = v;
            count = 1;
        }
    }
    runs.push(format!("{count}x{value}"));
    runs.join(" ")
}

/// Parsed grid, `cells` is row-major with row 0 being the southernmost row
pub struct ParsedGrid {
    pub header: AsciiHeader,
    pub cells: Vec<u8>,
}

pub fn parse<R: BufRead>(reader: R, path: &Path, compressed: bool) -> Result<ParsedGrid> {
    let mut cols = None;
    let mut rows = None;
    let mut xll = None;
    let mut yll = None;
    let mut cell_size = None;

    let mut header: Option<AsciiHeader> = None;
    let mut cells = Vec::new();
    // data rows are stored top down, so this counts down to 0
    let mut next_row = 0;
    let mut line_number = 0;

    for line in reader.lines() {
        let line = line?;
        line_number += 1;

        let words: Vec<&str> = line.split_whitespace().collect();
        if words.is_empty() {
            continue;
        }

        if header.is_none() {
            let key = words[0].to_ascii_uppercase();
            let is_key = matches!(
                key.as_str(),
                "NCOLS" | "NROWS" | "XLLCORNER" | "YLLCORNER" | "CELLSIZE" | "NODATA_VALUE"
            );
            if is_key {
                let invalid = || Error::InvalidHeader {
                    path: path.to_path_buf(),
                    line: line_number,
                };
                let value = words.get(1).ok_or_else(invalid)?;
                match key.as_str() {
                    "NCOLS" => cols = Some(value.parse::<usize>().map_err(|_| invalid())?),
                    "NROWS" => rows = Some(value.parse::<usize>().map_err(|_| invalid())?),
                    "XLLCORNER" => xll = Some(value.parse::<f64>().map_err(|_| invalid())?.floor()),
                    "YLLCORNER" => yll = Some(value.parse::<f64>().map_err(|_| invalid())?.floor()),
                    "CELLSIZE" => cell_size = Some(value.parse::<f64>().map_err(|_| invalid())?),
                    // the nodata value is always 0
                    _ => {
                        value.parse::<i32>().map_err(|_| invalid())?;
                    }
                }
                continue;
            }

            let Some(h) = complete_header(cols, rows, xll, yll, cell_size) else {
                return Err(Error::InvalidHeader {
                    path: path.to_path_buf(),
                    line: line_number,
                });
            };
            cells = vec![NODATA; h.cols * h.rows];
            next_row = h.rows;
            header = Some(h);
        }

        let Some(h) = header.as_ref() else {
            continue;
        };

        if next_row == 0 {
            return Err(Error::TooManyRows {
                path: path.to_path_buf(),
                expected: h.rows,
            });
        }
        next_row -= 1;

        let row = &mut cells[next_row * h.cols..(next_row + 1) * h.cols];
        if compressed {
            parse_compressed_row(&words, row, path, line_number)?;
        } else {
            if words.len() != h.cols {
                return Err(Error::InvalidColumnCount {
                    path: path.to_path_buf(),
                    line: line_number,
                    expected: h.cols,
                    found: words.len(),
                });
            }
            for (cell, word) in row.iter_mut().zip(words) {
                *cell = word.parse::<u8>().map_err(|_| Error::InvalidToken {
                    path: path.to_path_buf(),
                    line: line_number,
                    token: word.to_string(),
                })?;
            }
        }
    }

    let Some(header) = header else {
        // a valid header without a single data row
        if let Some(h) = complete_header(cols, rows, xll, yll, cell_size) {
            return Err(Error::TooFewRows {
                path: path.to_path_buf(),
                expected: h.rows,
                found: 0,
            });
        }
        return Err(Error::InvalidHeader {
            path: path.to_path_buf(),
            line: line_number,
        });
    };
    if next_row > 0 {
        return Err(Error::TooFewRows {
            path: path.to_path_buf(),
            expected: header.rows,
            found: header.rows - next_row,
        });
    }

    Ok(ParsedGrid { header, cells })
}

// None while a field is missing or the grid would not fit in memory
fn complete_header(
    cols: Option<usize>,
    rows: Option<usize>,
    xll: Option<f64>,
    yll: Option<f64>,
    cell_size: Option<f64>,
) -> Option<AsciiHeader> {
    let (cols, rows, xll, yll, cell_size) = (cols?, rows?, xll?, yll?, cell_size?);
    if cols == 0 || rows == 0 || cell_size <= 0. {
        return None;
    }
    cols.checked_mul(rows)?;
    Some(AsciiHeader {
        cols,
        rows,
        xll,
        yll,
        cell_size,
    })
}

fn parse_compressed_row(words: &[&str], row: &mut [u8], path: &Path, line: usize) -> Result<()> {
    let invalid_token = |word: &str| Error::InvalidToken {
        path: path.to_path_buf(),
        line,
        token: word.to_string(),
    };

    let mut col = 0;
    for word in words {
        let (count, value) = word.split_once('x').ok_or_else(|| invalid_token(word))?;
        let count = count.parse::<usize>().map_err(|_| invalid_token(word))?;
        let value = value.parse::<u8>().map_err(|_| invalid_token(word))?;

        if count > row.len() - col {
            return Err(Error::InvalidColumnCount {
                path: path.to_path_buf(),
                line,
                expected: row.len(),
                found: col.saturating_add(count),
            });
        }
        row[col..col + count].fill(value);
        col += count;
    }

    if col != row.len() {
        return Err(Error::InvalidColumnCount {
            path: path.to_path_buf(),
            line,
            expected: row.len(),
            found: col,
        });
    }
    Ok(())
}
