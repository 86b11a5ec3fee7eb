// src/store/sheets/mod.rs
// Google Sheets goal table
//
// Uses the first worksheet of a spreadsheet found by name. Row 1 holds the
// headers, so data row `position` lives on sheet row `position + 2`.
// Authentication and spreadsheet lookup happen on every call; nothing is
// cached between operations. The remote service serialises individual writes
// but two processes editing the same sheet can still race on row numbers.

pub mod auth;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, instrument};

use super::{GoalTable, Row, RowChange};
use crate::error::{GoalError, Result};
use crate::goals::{GoalField, GoalRecord};
use auth::ServiceAccountKey;

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const DRIVE_FILES_API: &str = "https://www.googleapis.com/drive/v3/files";
const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";
const REQUEST_TIMEOUT_SECS: u64 = 30;
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Sheet row holding the header
const HEADER_ROW: usize = 1;
/// Last column letter of the seven-field layout
const LAST_COLUMN: char = 'G';

/// Base URLs of the Sheets and Drive APIs. The token endpoint comes from the
/// service-account key file.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetsEndpoints {
    pub sheets_api: String,
    pub drive_files_api: String,
}

impl Default for SheetsEndpoints {
    fn default() -> Self {
        Self {
            sheets_api: SHEETS_API.to_string(),
            drive_files_api: DRIVE_FILES_API.to_string(),
        }
    }
}

pub struct SheetsTable {
    credentials_path: PathBuf,
    sheet_name: String,
    endpoints: SheetsEndpoints,
    http: reqwest::Client,
}

impl SheetsTable {
    pub fn new(credentials_path: impl Into<PathBuf>, sheet_name: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            credentials_path: credentials_path.into(),
            sheet_name: sheet_name.into(),
            endpoints: SheetsEndpoints::default(),
            http,
        }
    }

    pub fn with_endpoints(mut self, endpoints: SheetsEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Authenticate and open the first worksheet.
    #[instrument(skip(self), fields(sheet = %self.sheet_name))]
    async fn connect(&self) -> Result<Worksheet<'_>> {
        let key = ServiceAccountKey::from_file(&self.credentials_path).await?;
        let token = auth::access_token(&self.http, &key).await?;

        let mut ws = Worksheet {
            http: &self.http,
            endpoints: &self.endpoints,
            token,
            spreadsheet_id: String::new(),
            sheet_id: 0,
            title: String::new(),
        };
        ws.spreadsheet_id = ws.find_spreadsheet(&self.sheet_name, &key.client_email).await?;
        let (sheet_id, title) = ws.first_sheet().await?;
        ws.sheet_id = sheet_id;
        ws.title = title;

        debug!(spreadsheet_id = %ws.spreadsheet_id, worksheet = %ws.title, "Connected to Google Sheets");
        Ok(ws)
    }
}

#[async_trait]
impl GoalTable for SheetsTable {
    fn name(&self) -> &'static str {
        "remote_table"
    }

    async fn load(&self) -> Result<Vec<Row>> {
        let ws = self.connect().await?;
        let values = ws.get_values().await?;

        if values.is_empty() {
            ws.put_row(HEADER_ROW, GoalField::headers()).await?;
            info!(sheet = %self.sheet_name, "Wrote header row to empty worksheet");
            return Ok(Vec::new());
        }

        parse_rows(&values)
    }

    async fn apply(&self, _rows: Vec<Row>, change: RowChange) -> Result<()> {
        let ws = self.connect().await?;

        match change {
            RowChange::Append(record) => ws.append_row(record.to_cells()).await,
            RowChange::Replace { position, record } => {
                ws.put_row(sheet_row(position), record.to_cells()).await
            }
            RowChange::Remove { position } => ws.delete_row(sheet_row(position)).await,
        }
    }
}

/// One authenticated session against a worksheet
struct Worksheet<'a> {
    http: &'a reqwest::Client,
    endpoints: &'a SheetsEndpoints,
    token: String,
    spreadsheet_id: String,
    sheet_id: i64,
    title: String,
}

#[derive(Debug, Deserialize)]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    sheet_id: i64,
    title: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

impl Worksheet<'_> {
    async fn find_spreadsheet(&self, name: &str, client_email: &str) -> Result<String> {
        let query = drive_query(name);
        let response = self
            .http
            .get(&self.endpoints.drive_files_api)
            .bearer_auth(&self.token)
            .query(&[
                ("q", query.as_str()),
                ("fields", "files(id,name)"),
                ("supportsAllDrives", "true"),
                ("includeItemsFromAllDrives", "true"),
            ])
            .send()
            .await?;
        let list: DriveFileList = serde_json::from_value(check(response).await?)?;

        list.files
            .into_iter()
            .next()
            .map(|f| f.id)
            .ok_or_else(|| GoalError::RemoteApi {
                status: 404,
                body: format!(
                    "spreadsheet '{}' not found or not shared with {}",
                    name, client_email
                ),
            })
    }

    async fn first_sheet(&self) -> Result<(i64, String)> {
        let url = format!("{}/{}", self.endpoints.sheets_api, self.spreadsheet_id);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .query(&[("fields", "sheets.properties(sheetId,title,index)")])
            .send()
            .await?;
        let meta: SpreadsheetMeta = serde_json::from_value(check(response).await?)?;

        meta.sheets
            .into_iter()
            .next()
            .map(|s| (s.properties.sheet_id, s.properties.title))
            .ok_or_else(|| GoalError::Schema("spreadsheet has no worksheets".into()))
    }

    fn values_url(&self, cells: &str) -> String {
        format!(
            "{}/{}/values/{}",
            self.endpoints.sheets_api,
            self.spreadsheet_id,
            urlencoding::encode(&a1_range(&self.title, cells))
        )
    }

    async fn get_values(&self) -> Result<Vec<Vec<String>>> {
        let response = self
            .http
            .get(self.values_url(&format!("A:{LAST_COLUMN}")))
            .bearer_auth(&self.token)
            .send()
            .await?;
        let range: ValueRange = serde_json::from_value(check(response).await?)?;
        Ok(range.values)
    }

    async fn put_row(&self, row: usize, cells: Vec<String>) -> Result<()> {
        let cells_range = row_range(row);
        let response = self
            .http
            .put(self.values_url(&cells_range))
            .bearer_auth(&self.token)
            .query(&[("valueInputOption", "RAW")])
            .json(&json!({
                "range": a1_range(&self.title, &cells_range),
                "majorDimension": "ROWS",
                "values": [cells],
            }))
            .send()
            .await?;
        check(response).await?;
        debug!(row, "Sheet row written");
        Ok(())
    }

    async fn append_row(&self, cells: Vec<String>) -> Result<()> {
        let url = format!("{}:append", self.values_url(&format!("A1:{LAST_COLUMN}1")));
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .query(&[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")])
            .json(&json!({ "majorDimension": "ROWS", "values": [cells] }))
            .send()
            .await?;
        check(response).await?;
        debug!("Sheet row appended");
        Ok(())
    }

    async fn delete_row(&self, row: usize) -> Result<()> {
        let url = format!(
            "{}/{}:batchUpdate",
            self.endpoints.sheets_api, self.spreadsheet_id
        );
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(&delete_row_request(self.sheet_id, row))
            .send()
            .await?;
        check(response).await?;
        debug!(row, "Sheet row deleted");
        Ok(())
    }
}

/// Map non-success statuses to RemoteApi errors, returning the JSON body.
async fn check(response: reqwest::Response) -> Result<Value> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(GoalError::RemoteApi {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response.json().await?)
}

/// Sheet row (1-indexed, header on row 1) of a data row position.
fn sheet_row(position: usize) -> usize {
    position + HEADER_ROW + 1
}

fn row_range(row: usize) -> String {
    format!("A{row}:{LAST_COLUMN}{row}")
}

/// A1 notation with the worksheet title quoted.
fn a1_range(title: &str, cells: &str) -> String {
    format!("'{}'!{}", title.replace('\'', "''"), cells)
}

fn drive_query(name: &str) -> String {
    let escaped = name.replace('\\', "\\\\").replace('\'', "\\'");
    format!("name = '{escaped}' and mimeType = '{SPREADSHEET_MIME}' and trashed = false")
}

fn delete_row_request(sheet_id: i64, row: usize) -> Value {
    json!({
        "requests": [{
            "deleteDimension": {
                "range": {
                    "sheetId": sheet_id,
                    "dimension": "ROWS",
                    "startIndex": row - 1,
                    "endIndex": row,
                }
            }
        }]
    })
}

/// Validate the header row and turn the remaining rows into records. Blank
/// rows are skipped but still count toward positions.
fn parse_rows(values: &[Vec<String>]) -> Result<Vec<Row>> {
    let Some((header, data)) = values.split_first() else {
        return Ok(Vec::new());
    };

    let mut found: Vec<&str> = header.iter().map(|h| h.trim()).collect();
    while found.last().is_some_and(|h| h.is_empty()) {
        found.pop();
    }
    if found != GoalField::headers() {
        return Err(GoalError::Schema(format!(
            "expected header [{}], found [{}]",
            GoalField::headers().join(", "),
            found.join(", ")
        )));
    }

    let mut rows = Vec::with_capacity(data.len());
    for (position, cells) in data.iter().enumerate() {
        if cells.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        let record = GoalRecord::from_cells(cells).ok_or_else(|| {
            GoalError::Schema(format!(
                "sheet row {} has an unrecognised status",
                sheet_row(position)
            ))
        })?;
        rows.push(Row { position, record });
    }
    Ok(rows)
}
