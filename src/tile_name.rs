//! Names of the national map sheets in ETRS-TM35FIN.
//!
//! A name starts with a row letter and a column digit for the 192 km x 96 km
//! sheet, then descends one character per level: quadrant digits 1..4, the
//! letters A..H for the eight 6 km squares of a 24 km x 12 km sheet, and
//! `_1`..`_9` for the 1 km squares of a 3 km sheet. A trailing L or R on a
//! 24 km x 12 km sheet selects its left or right 12 km half.
//!
//! Sheets are half-open, the max edges belong to the neighbouring sheet.

use crate::{Error, Result};

use geo::{Coord, Rect};

const ROW_LETTERS: [char; 13] = [
    'K', 'L', 'M', 'N', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X',
];
// bottom row of the 6 km squares, the top row is the next letter of each
const BOTTOM_SQUARE_LETTERS: [char; 4] = ['A', 'C', 'E', 'G'];

// min corner of the first column if it were a full sheet
const ORIGIN_EAST: i32 = -76_000;
const ORIGIN_NORTH: i32 = 6_570_000;

const TOP_SIZE_EAST: i32 = 192_000;
const TOP_SIZE_NORTH: i32 = 96_000;
const FIRST_COLUMN_DIGIT: i32 = 2;

const MIN_EAST: i32 = 20_000;
const MAX_EAST: i32 = ORIGIN_EAST + 4 * TOP_SIZE_EAST;
const MIN_NORTH: i32 = ORIGIN_NORTH;
const MAX_NORTH: i32 = ORIGIN_NORTH + 13 * TOP_SIZE_NORTH;

const HALF_SHEET_NORTH: i32 = 12_000;
const SQUARE_SHEET: i32 = 3_000;
const SMALLEST_SHEET: i32 = 1_000;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Sheet {
    min_east: i32,
    min_north: i32,
    size_east: i32,
    size_north: i32,
}

impl Sheet {
    fn top_level(column: i32, row: i32) -> Sheet {
        Sheet {
            min_east: ORIGIN_EAST + column * TOP_SIZE_EAST,
            min_north: ORIGIN_NORTH + row * TOP_SIZE_NORTH,
            size_east: TOP_SIZE_EAST,
            size_north: TOP_SIZE_NORTH,
        }
    }

    fn is_eight_part(&self) -> bool {
        self.size_north == HALF_SHEET_NORTH && self.size_east == 2 * HALF_SHEET_NORTH
    }

    fn is_nine_part(&self) -> bool {
        self.size_north == SQUARE_SHEET && self.size_east == SQUARE_SHEET
    }

    /// The child sheet `(col, row)` when split into `cols` x `rows` parts
    fn child(&self, cols: i32, rows: i32, col: i32, row: i32) -> Sheet {
        let size_east = self.size_east / cols;
        let size_north = self.size_north / rows;
        Sheet {
            min_east: self.min_east + col * size_east,
            min_north: self.min_north + row * size_north,
            size_east,
            size_north,
        }
    }

    fn extent(&self) -> Rect {
        Rect::new(
            Coord {
                x: self.min_east as f64,
                y: self.min_north as f64,
            },
            Coord {
                x: (self.min_east + self.size_east) as f64,
                y: (self.min_north + self.size_north) as f64,
            },
        )
    }
}

/// Name of the sheet containing (east, north) whose north edge is at most
/// `size` metres. A size of exactly 12000 gives the 12 km x 12 km half sheet,
/// sizes below 1000 give the 1 km square.
pub fn encode(east: i32, north: i32, size: i32) -> Result<String> {
    if size <= 0 {
        return Err(Error::InvalidTileSize(size));
    }
    if !(MIN_EAST..MAX_EAST).contains(&east) || !(MIN_NORTH..MAX_NORTH).contains(&north) {
        return Err(Error::TileOutOfRange { east, north });
    }

    let row = (north - ORIGIN_NORTH) / TOP_SIZE_NORTH;
    let column = (east - ORIGIN_EAST) / TOP_SIZE_EAST;
    let mut name = format!("{}{}", ROW_LETTERS[row as usize], column + FIRST_COLUMN_DIGIT);
    let mut sheet = Sheet::top_level(column, row);

    while size < sheet.size_north && sheet.size_north > SMALLEST_SHEET {
        if sheet.is_eight_part() {
            let col = (east - sheet.min_east) / (sheet.size_east / 4);
            let row = (north - sheet.min_north) / (sheet.size_north / 2);
            let letter = BOTTOM_SQUARE_LETTERS[col as usize] as u8 + row as u8;
            name.push(letter as char);
            sheet = sheet.child(4, 2, col, row);
        } else if sheet.is_nine_part() {
            let col = (east - sheet.min_east) / SMALLEST_SHEET;
            let row = (north - sheet.min_north) / SMALLEST_SHEET;
            name.push('_');
            name.push_str(&(col * 3 + row + 1).to_string());
            sheet = sheet.child(3, 3, col, row);
        } else {
            let col = (east - sheet.min_east) / (sheet.size_east / 2);
            let row = (north - sheet.min_north) / (sheet.size_north / 2);
            name.push_str(&(col * 2 + row + 1).to_string());
            sheet = sheet.child(2, 2, col, row);

            if size == HALF_SHEET_NORTH && sheet.is_eight_part() {
                let half = (east - sheet.min_east) / HALF_SHEET_NORTH;
                name.push(if half == 0 { 'L' } else { 'R' });
                break;
            }
        }
    }

    Ok(name)
}

/// Extent of the named sheet, case-insensitive
pub fn decode(name: &str) -> Result<Rect> {
    let invalid = || Error::InvalidTileName(name.to_string());
    let upper = name.to_ascii_uppercase();
    let mut chars = upper.chars().peekable();

    let row = chars
        .next()
        .and_then(|c| ROW_LETTERS.iter().position(|&l| l == c))
        .ok_or_else(invalid)?;
    let column = chars
        .next()
        .and_then(|c| c.to_digit(10))
        .map(|d| d as i32 - FIRST_COLUMN_DIGIT)
        .filter(|c| (0..4).contains(c))
        .ok_or_else(invalid)?;

    let mut sheet = Sheet::top_level(column, row as i32);

    while let Some(c) = chars.next() {
        if sheet.is_eight_part() {
            if chars.peek().is_none() && (c == 'L' || c == 'R') {
                let half = if c == 'L' { 0 } else { 1 };
                sheet = sheet.child(2, 1, half, 0);
                break;
            }
            let offset = (c as i32) - ('A' as i32);
            if !(0..8).contains(&offset) {
                return Err(invalid());
            }
            sheet = sheet.child(4, 2, offset / 2, offset % 2);
        } else if sheet.is_nine_part() {
            let d = chars
                .next()
                .filter(|_| c == '_')
                .and_then(|d| d.to_digit(10))
                .filter(|d| (1..=9).contains(d))
                .ok_or_else(invalid)? as i32;
            sheet = sheet.child(3, 3, (d - 1) / 3, (d - 1) % 3);
        } else if sheet.size_north > SMALLEST_SHEET {
            let d = c
                .to_digit(10)
                .filter(|d| (1..=4).contains(d))
                .ok_or_else(invalid)? as i32;
            sheet = sheet.child(2, 2, (d - 1) / 2, (d - 1) % 2);
        } else {
            return Err(invalid());
        }
    }

    Ok(sheet.extent())
}
