//! 行解析服务 - 业务能力层
//!
//! 把页面上的一行单元格转换成 `ParsedRecord`，或者给出有意跳过的信号。
//! 每种记录来源一个解析器，按账户类型在注册表中选择。

use chrono::NaiveDate;
use regex::Regex;

use crate::error::{HarvestError, Result};
use crate::models::{Account, DetailKind, ParseOutcome, ParsedRecord, RawRow, PINNED_SORT_DATE};
use crate::services::artifact_namer::{artifact_key, normalize_amount, KeyFields};

/// 交易历史（证券 / EAC / DAF）的列数
pub const HISTORY_CELL_COUNT: usize = 7;
/// 银行历史的列数
pub const BANK_CELL_COUNT: usize = 7;
/// 对账单列表的文档行列数
pub const STATEMENT_CELL_COUNT: usize = 4;
/// 对账单列表的汇总行列数
pub const STATEMENT_SUMMARY_CELL_COUNT: usize = 3;

/// 页面用来占位空单元格的文本
const BLANK_PLACEHOLDER: &str = "blank";

/// 行解析器
pub trait RowParser: Send + Sync {
    /// 解析器名称（用于日志和错误信息）
    fn name(&self) -> &'static str;

    /// 解析一行
    fn parse(&self, row: RawRow, account: &Account) -> Result<ParseOutcome>;
}

/// 证券 / DAF 交易历史
///
/// 列：日期、操作、代码/描述、数量、价格、费用、金额
#[derive(Debug, Default)]
pub struct BrokerageHistoryParser;

impl RowParser for BrokerageHistoryParser {
    fn name(&self) -> &'static str {
        "brokerage-history"
    }

    fn parse(&self, row: RawRow, account: &Account) -> Result<ParseOutcome> {
        parse_history_row(self.name(), row, account)
    }
}

/// EAC 交易历史
///
/// 没有详情链接的行一律跳过，排序日期固定为远古日期
#[derive(Debug, Default)]
pub struct EacHistoryParser;

impl RowParser for EacHistoryParser {
    fn name(&self) -> &'static str {
        "eac-history"
    }

    fn parse(&self, row: RawRow, account: &Account) -> Result<ParseOutcome> {
        if row.handle.is_none() {
            return Ok(ParseOutcome::Skip {
                sort_date: PINNED_SORT_DATE,
                reason: "EAC 行没有可打开的详情",
            });
        }
        parse_history_row(self.name(), row, account)
    }
}

/// 银行交易历史
///
/// 列：日期、类型、支票号、描述、取款、存款、余额
#[derive(Debug, Default)]
pub struct BankHistoryParser;

impl RowParser for BankHistoryParser {
    fn name(&self) -> &'static str {
        "bank-history"
    }

    fn parse(&self, row: RawRow, account: &Account) -> Result<ParseOutcome> {
        let cells = normalize_cells(&row.cells);
        expect_cell_count(self.name(), &cells, BANK_CELL_COUNT)?;

        let date = parse_row_date(self.name(), &cells[0])?;
        let record_type = cells[1].clone();
        let description = cells[3].clone();

        let withdrawal = normalize_amount(&cells[4]);
        let deposit = normalize_amount(&cells[5]);
        let amount = match (withdrawal.is_empty(), deposit.is_empty()) {
            (false, true) => withdrawal,
            (true, false) => deposit,
            _ => {
                return Err(HarvestError::structural(
                    self.name(),
                    format!(
                        "取款列与存款列必须恰好一个非空 (取款: '{}', 存款: '{}')",
                        cells[4], cells[5]
                    ),
                ))
            }
        };

        let detail = DetailKind::for_record_type(&record_type);
        let check_number = match detail {
            DetailKind::Check if !cells[2].is_empty() => Some(cells[2].clone()),
            _ => None,
        };
        let tail = check_number.as_deref().unwrap_or(&description);

        let artifact_key = artifact_key(
            account,
            KeyFields {
                date,
                record_type: &record_type,
                amount: Some(&amount),
                tail,
            },
        );

        Ok(ParseOutcome::Record(ParsedRecord {
            date,
            record_type,
            description,
            amount_or_quantity: amount,
            check_number,
            artifact_key,
            detail,
            retrieval_handle: row.handle,
        }))
    }
}

/// 对账单列表
///
/// 3 列是汇总行（跳过）；4 列：日期、文档类型、标题、操作
#[derive(Debug, Default)]
pub struct StatementParser;

impl RowParser for StatementParser {
    fn name(&self) -> &'static str {
        "statement"
    }

    fn parse(&self, row: RawRow, account: &Account) -> Result<ParseOutcome> {
        let cells = normalize_cells(&row.cells);
        if cells.len() == STATEMENT_SUMMARY_CELL_COUNT {
            return Ok(ParseOutcome::Skip {
                sort_date: PINNED_SORT_DATE,
                reason: "对账单汇总行",
            });
        }
        expect_cell_count(self.name(), &cells, STATEMENT_CELL_COUNT)?;

        let date = parse_row_date(self.name(), &cells[0])?;
        let record_type = cells[1].clone();
        // 标题后面可能附带监管说明，只保留第一行
        let title = cells[2]
            .split('\n')
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();

        let artifact_key = artifact_key(
            account,
            KeyFields {
                date,
                record_type: &record_type,
                amount: None,
                tail: &title,
            },
        );

        Ok(ParseOutcome::Record(ParsedRecord {
            date,
            record_type,
            description: title,
            amount_or_quantity: String::new(),
            check_number: None,
            artifact_key,
            detail: DetailKind::Statement,
            retrieval_handle: row.handle,
        }))
    }
}

fn parse_history_row(parser: &str, row: RawRow, account: &Account) -> Result<ParseOutcome> {
    let cells = normalize_cells(&row.cells);
    expect_cell_count(parser, &cells, HISTORY_CELL_COUNT)?;

    let date = parse_row_date(parser, &cells[0])?;
    let record_type = cells[1].clone();
    let description = cells[2].clone();
    let amount = normalize_amount(&cells[6]);
    let amount_or_quantity = if amount.is_empty() {
        normalize_amount(&cells[3])
    } else {
        amount
    };

    let artifact_key = artifact_key(
        account,
        KeyFields {
            date,
            record_type: &record_type,
            amount: Some(&amount_or_quantity),
            tail: &description,
        },
    );

    Ok(ParseOutcome::Record(ParsedRecord {
        date,
        detail: DetailKind::for_record_type(&record_type),
        record_type,
        description,
        amount_or_quantity,
        check_number: None,
        artifact_key,
        retrieval_handle: row.handle,
    }))
}

/// 去掉首尾空白，占位文本 "blank" 视为空
fn normalize_cells(cells: &[String]) -> Vec<String> {
    cells
        .iter()
        .map(|cell| {
            let cell = cell.trim();
            if cell == BLANK_PLACEHOLDER {
                String::new()
            } else {
                cell.to_string()
            }
        })
        .collect()
}

fn expect_cell_count(parser: &str, cells: &[String], expected: usize) -> Result<()> {
    if cells.len() != expected {
        return Err(HarvestError::structural(
            parser,
            format!("期望 {} 个单元格，实际 {} 个: {:?}", expected, cells.len(), cells),
        ));
    }
    Ok(())
}

/// 解析日期单元格，例如 "01/05/2023" 或 "01/05/2023 as of 01/04/2023"
fn parse_row_date(parser: &str, cell: &str) -> Result<NaiveDate> {
    let re = Regex::new(r"^(\d{1,2}/\d{1,2}/\d{4})")?;
    let token = re
        .captures(cell)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| HarvestError::structural(parser, format!("无法识别日期: '{}'", cell)))?;

    NaiveDate::parse_from_str(token, "%m/%d/%Y").map_err(|e| {
        HarvestError::structural(parser, format!("无法解析日期 '{}': {}", token, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccountKind, RetrievalHandle};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(cells: &[&str], with_handle: bool) -> RawRow {
        RawRow::new(
            cells.iter().map(|c| c.to_string()).collect(),
            with_handle.then(|| RetrievalHandle {
                page_index: 0,
                row_index: 0,
                href: None,
            }),
        )
    }

    fn expect_record(outcome: ParseOutcome) -> ParsedRecord {
        match outcome {
            ParseOutcome::Record(record) => record,
            other => panic!("期望解析出记录，实际: {:?}", other),
        }
    }

    #[test]
    fn test_brokerage_row() {
        let account = Account::new("...9876", "Joint Brokerage", AccountKind::Brokerage);
        let outcome = BrokerageHistoryParser
            .parse(
                row(
                    &[
                        "03/10/2023 as of 03/09/2023",
                        "Buy",
                        "VTI VANGUARD TOTAL STOCK MARKET ETF",
                        "10",
                        "$200.00",
                        "blank",
                        "-$2,000.00",
                    ],
                    true,
                ),
                &account,
            )
            .unwrap();

        let record = expect_record(outcome);
        assert_eq!(record.date, ymd(2023, 3, 10));
        assert_eq!(record.amount_or_quantity, "2000.00");
        assert_eq!(record.detail, DetailKind::Trade);
        assert_eq!(
            record.artifact_key,
            "schwab_brokerage_9876_JointBrokerage_20230310_Buy_2000.00_VtiVanguardTotalStockMarketEtf"
        );
    }

    #[test]
    fn test_brokerage_quantity_when_amount_blank() {
        let account = Account::new("...9876", "Joint", AccountKind::Brokerage);
        let record = expect_record(
            BrokerageHistoryParser
                .parse(
                    row(
                        &["01/02/2023", "Journaled Shares", "AAPL", "5", "", "", ""],
                        true,
                    ),
                    &account,
                )
                .unwrap(),
        );
        assert_eq!(record.amount_or_quantity, "5");
    }

    #[test]
    fn test_history_wrong_cell_count_is_structural() {
        let account = Account::new("...9876", "Joint", AccountKind::Brokerage);
        for cells in [
            vec!["01/02/2023", "Buy", "AAPL"],
            vec!["01/02/2023", "Buy", "AAPL", "1", "2", "3", "4", "5", "6"],
        ] {
            let err = BrokerageHistoryParser
                .parse(row(&cells, true), &account)
                .unwrap_err();
            assert!(matches!(err, HarvestError::StructuralMismatch { .. }));
        }
    }

    #[test]
    fn test_bank_deposit_row() {
        let account = Account::new("...1234", "MyChecking", AccountKind::Bank);
        let record = expect_record(
            BankHistoryParser
                .parse(
                    row(
                        &["02/01/2023", "Deposit", "", "Payroll ACME", "", "$40.00", "$1,040.00"],
                        true,
                    ),
                    &account,
                )
                .unwrap(),
        );
        assert_eq!(record.amount_or_quantity, "40.00");
        assert_eq!(record.check_number, None);
        assert_eq!(
            record.artifact_key,
            "schwab_bank_1234_MyChecking_20230201_Deposit_40.00_PayrollAcme"
        );
    }

    #[test]
    fn test_bank_check_uses_check_number() {
        let account = Account::new("...1234", "MyChecking", AccountKind::Bank);
        let record = expect_record(
            BankHistoryParser
                .parse(
                    row(
                        &["01/20/2023", "Check", "1042", "Check Paid", "-$75.50", "", "$900.00"],
                        true,
                    ),
                    &account,
                )
                .unwrap(),
        );
        assert_eq!(record.detail, DetailKind::Check);
        assert_eq!(record.check_number.as_deref(), Some("1042"));
        assert_eq!(
            record.artifact_key,
            "schwab_bank_1234_MyChecking_20230120_Check_75.50_1042"
        );
    }

    #[test]
    fn test_bank_requires_exactly_one_amount_column() {
        let account = Account::new("...1234", "MyChecking", AccountKind::Bank);
        let both = row(
            &["02/01/2023", "Deposit", "", "X", "$1.00", "$2.00", "$0.00"],
            true,
        );
        let neither = row(&["02/01/2023", "Deposit", "", "X", "", "blank", "$0.00"], true);
        for r in [both, neither] {
            let err = BankHistoryParser.parse(r, &account).unwrap_err();
            assert!(matches!(err, HarvestError::StructuralMismatch { .. }));
        }
    }

    #[test]
    fn test_bad_date_is_structural() {
        let account = Account::new("...1234", "MyChecking", AccountKind::Bank);
        let err = BankHistoryParser
            .parse(
                row(&["Pending", "Deposit", "", "X", "", "$2.00", "$0.00"], true),
                &account,
            )
            .unwrap_err();
        assert!(matches!(err, HarvestError::StructuralMismatch { .. }));
    }

    #[test]
    fn test_eac_row_without_detail_is_pinned_skip() {
        let account = Account::new("EAC", "Equity Awards", AccountKind::Eac);
        let outcome = EacHistoryParser
            .parse(
                row(&["01/02/2023", "Vest", "ACME", "10", "", "", ""], false),
                &account,
            )
            .unwrap();
        assert_eq!(
            outcome,
            ParseOutcome::Skip {
                sort_date: PINNED_SORT_DATE,
                reason: "EAC 行没有可打开的详情",
            }
        );

        let record = expect_record(
            EacHistoryParser
                .parse(
                    row(&["01/02/2023", "Sale", "ACME", "10", "$5", "", "$50.00"], true),
                    &account,
                )
                .unwrap(),
        );
        assert!(record.artifact_key.starts_with("schwab_eac_EAC_EquityAwards_20230102_Sale"));
    }

    #[test]
    fn test_statement_rows() {
        let account = Account::new("...9876", "Joint", AccountKind::Brokerage);

        let summary = StatementParser
            .parse(row(&["2023", "12 documents", ""], false), &account)
            .unwrap();
        assert!(matches!(summary, ParseOutcome::Skip { .. }));

        let record = expect_record(
            StatementParser
                .parse(
                    row(
                        &[
                            "01/31/2023",
                            "Statement",
                            "Brokerage Statement\nImportant regulatory insert",
                            "PDF",
                        ],
                        true,
                    ),
                    &account,
                )
                .unwrap(),
        );
        assert_eq!(record.description, "Brokerage Statement");
        assert_eq!(record.detail, DetailKind::Statement);
        assert_eq!(
            record.artifact_key,
            "schwab_brokerage_9876_Joint_20230131_Statement_BrokerageStatement"
        );

        let err = StatementParser
            .parse(row(&["01/31/2023", "Statement"], true), &account)
            .unwrap_err();
        assert!(matches!(err, HarvestError::StructuralMismatch { .. }));
    }
}
