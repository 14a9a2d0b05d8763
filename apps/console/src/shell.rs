//! # Interactive Shell
//!
//! The numbered menu the operator drives.
//!
//! ## Menu Loop
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Menu Loop                                       │
//! │                                                                         │
//! │   ┌──────────────┐                                                      │
//! │   │  print menu  │◄──────────────────────────────────────┐             │
//! │   └──────┬───────┘                                       │             │
//! │          ▼                                               │             │
//! │   read choice ── end of input ──► exit                   │             │
//! │          │                                               │             │
//! │          ├── 1 Search Products ──┐                       │             │
//! │          ├── 2 Register Sale ────┤                       │             │
//! │          ├── 3 Cancel Sale ──────┼── Err(AppError) ──► "Error: ..." ──┤
//! │          ├── 4 Check Stock ──────┘         Ok ───────────────────────┤
//! │          ├── 5 Exit ──► exit                                          │
//! │          └── other ──► "Invalid option. Please try again." ──────────┘
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Register Sale keeps a pending list of lines. Stock is only checked while
//! the list is built (pending quantities of the same product count against
//! it) and only decremented when the finished list is handed to
//! [`SaleService::create_sale`].
//!
//! The shell reads from any `BufRead` and writes to any `Write`, so tests
//! drive it with byte slices.

use std::io::{self, BufRead, Write};

use chrono::{DateTime, Local, Utc};
use console::style;
use tracing::debug;

use crate::config::ShopConfig;
use crate::error::{AppError, ErrorCode};
use crate::services::{ProductService, SaleService};
use cornershop_core::validation::parse_quantity;
use cornershop_core::{Money, SaleLine};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";
const RULE: &str = "===================";

/// Top-level menu entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    SearchProducts,
    RegisterSale,
    CancelSale,
    CheckStock,
    Exit,
}

impl MenuChoice {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(MenuChoice::SearchProducts),
            "2" => Some(MenuChoice::RegisterSale),
            "3" => Some(MenuChoice::CancelSale),
            "4" => Some(MenuChoice::CheckStock),
            "5" => Some(MenuChoice::Exit),
            _ => None,
        }
    }
}

/// Failure of a single menu action.
#[derive(Debug, thiserror::Error)]
enum ShellError {
    /// Reported to the operator; the loop continues.
    #[error(transparent)]
    App(#[from] AppError),

    /// Terminal is gone; the loop stops.
    #[error(transparent)]
    Io(#[from] io::Error),
}

type ActionResult = Result<(), ShellError>;

pub struct Shell<R, W> {
    products: ProductService,
    sales: SaleService,
    store_name: String,
    recent_sales_limit: u32,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Shell<R, W> {
    pub fn new(
        products: ProductService,
        sales: SaleService,
        config: &ShopConfig,
        input: R,
        output: W,
    ) -> Self {
        Shell {
            products,
            sales,
            store_name: config.store_name.clone(),
            recent_sales_limit: config.recent_sales_limit,
            input,
            output,
        }
    }

    /// Hands back the output sink.
    pub fn into_output(self) -> W {
        self.output
    }

    /// Runs the menu until Exit or end of input.
    ///
    /// Only I/O failures on the terminal end the loop with an error; any
    /// failure inside an action is printed and the menu is shown again.
    pub async fn run(&mut self) -> io::Result<()> {
        loop {
            self.print_menu()?;

            let Some(choice) = self.prompt("\nSelect an option: ")? else {
                break;
            };
            writeln!(self.output)?;

            let result = match MenuChoice::parse(&choice) {
                Some(MenuChoice::SearchProducts) => self.search_products().await,
                Some(MenuChoice::RegisterSale) => self.register_sale().await,
                Some(MenuChoice::CancelSale) => self.cancel_sale().await,
                Some(MenuChoice::CheckStock) => self.check_stock().await,
                Some(MenuChoice::Exit) => break,
                None => {
                    writeln!(self.output, "Invalid option. Please try again.")?;
                    continue;
                }
            };

            match result {
                Ok(()) => {}
                Err(ShellError::App(err)) => {
                    debug!(code = ?err.code, message = %err.message, "Menu action failed");
                    writeln!(self.output, "{}", style(format!("Error: {}", err)).red())?;
                }
                Err(ShellError::Io(err)) => return Err(err),
            }
        }

        self.output.flush()
    }

    fn print_menu(&mut self) -> io::Result<()> {
        writeln!(self.output)?;
        writeln!(
            self.output,
            "{}",
            style(format!("{} Management System", self.store_name)).bold()
        )?;
        writeln!(self.output, "1. Search Products")?;
        writeln!(self.output, "2. Register Sale")?;
        writeln!(self.output, "3. Cancel Sale")?;
        writeln!(self.output, "4. Check Stock")?;
        writeln!(self.output, "5. Exit")
    }

    /// Writes `message`, then reads one trimmed line. `None` at end of input.
    fn prompt(&mut self, message: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}", message)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }

        Ok(Some(line.trim().to_string()))
    }

    // =========================================================================
    // 1. Search Products
    // =========================================================================

    async fn search_products(&mut self) -> ActionResult {
        let Some(term) = self.prompt("Enter search term: ")? else {
            return Ok(());
        };

        let products = self.products.search(&term).await?;
        if products.is_empty() {
            writeln!(self.output, "No products found.")?;
            return Ok(());
        }

        for product in &products {
            writeln!(self.output, "Name: {}", style(&product.name).bold())?;
            writeln!(self.output, "Category: {}", product.category)?;
            writeln!(self.output, "Price: {}", product.price())?;
            writeln!(self.output, "Stock: {}", product.stock_quantity)?;
            writeln!(self.output)?;
        }

        Ok(())
    }

    // =========================================================================
    // 2. Register Sale
    // =========================================================================

    async fn register_sale(&mut self) -> ActionResult {
        let mut pending: Vec<SaleLine> = Vec::new();

        loop {
            let Some(name) = self.prompt("Enter product name (or 'done' to finish): ")? else {
                return Ok(());
            };
            if name.eq_ignore_ascii_case("done") {
                break;
            }

            let Some(product) = self.products.get_by_name(&name).await? else {
                writeln!(self.output, "{}", style("Product not found.").yellow())?;
                continue;
            };

            let Some(quantity_input) = self.prompt("Enter quantity: ")? else {
                return Ok(());
            };
            let Ok(quantity) = parse_quantity(&quantity_input) else {
                writeln!(self.output, "{}", style("Invalid quantity.").yellow())?;
                continue;
            };

            let already_pending: i64 = pending
                .iter()
                .filter(|line| line.product.id == product.id)
                .map(|line| line.quantity)
                .sum();

            let checked = self
                .products
                .check_sale_line(&product.name, already_pending + quantity)
                .await;

            if let Err(err) = checked {
                let message = match err.code {
                    ErrorCode::InsufficientStock => "Insufficient stock.",
                    ErrorCode::NotFound => "Product not found.",
                    ErrorCode::ValidationError => "Invalid quantity.",
                    ErrorCode::DatabaseError | ErrorCode::Internal => return Err(err.into()),
                };
                writeln!(self.output, "{}", style(message).yellow())?;
                continue;
            }

            writeln!(
                self.output,
                "{}",
                style(format!("Added {} x {}", quantity, product.name)).dim()
            )?;
            pending.push(SaleLine::new(product, quantity));
        }

        if pending.is_empty() {
            writeln!(self.output, "No items added to sale.")?;
            return Ok(());
        }

        self.print_summary(&pending, Utc::now())?;

        let sale_id = self.sales.create_sale(&pending).await?;
        writeln!(
            self.output,
            "\n{} Sale ID: {}",
            style("Sale registered successfully.").green(),
            sale_id
        )?;

        Ok(())
    }

    fn print_summary(&mut self, lines: &[SaleLine], at: DateTime<Utc>) -> io::Result<()> {
        writeln!(self.output, "\n{}", style("Transaction Summary:").bold())?;
        writeln!(self.output, "{}", RULE)?;
        writeln!(self.output, "Date: {}", format_timestamp(at))?;
        writeln!(self.output, "\nItems:")?;

        for line in lines {
            writeln!(self.output, "- {}", line.product.name)?;
            writeln!(self.output, "  Quantity: {}", line.quantity)?;
            writeln!(self.output, "  Price: {}", line.product.price())?;
            writeln!(self.output, "  Subtotal: {}", line.subtotal())?;
            writeln!(self.output)?;
        }

        let total: Money = lines.iter().map(SaleLine::subtotal).sum();
        writeln!(self.output, "Total: {}", style(total).bold())?;
        writeln!(self.output, "{}", RULE)
    }

    // =========================================================================
    // 3. Cancel Sale
    // =========================================================================

    async fn cancel_sale(&mut self) -> ActionResult {
        writeln!(self.output, "{}", style("Recent Sales:").bold())?;

        let recent = self.sales.get_recent_sales(self.recent_sales_limit).await?;
        if recent.is_empty() {
            writeln!(self.output, "No recent sales found.")?;
            return Ok(());
        }

        for (idx, sale) in recent.iter().enumerate() {
            writeln!(self.output, "\n{}. Sale ID: {}", idx + 1, sale.id)?;
            writeln!(self.output, "   Date: {}", format_timestamp(sale.created_at))?;
            writeln!(self.output, "   Total: {}", sale.total())?;
            writeln!(self.output, "   Items:")?;
            for item in &sale.items {
                writeln!(
                    self.output,
                    "   - {}: {} x {}",
                    item.product_name,
                    item.quantity,
                    item.unit_price()
                )?;
            }
        }

        let Some(selection) =
            self.prompt("\nEnter the number of the sale to cancel (or 0 to go back): ")?
        else {
            return Ok(());
        };

        let choice = match selection.parse::<usize>() {
            Ok(n) if n <= recent.len() => n,
            _ => {
                writeln!(self.output, "Invalid selection.")?;
                return Ok(());
            }
        };
        if choice == 0 {
            return Ok(());
        }

        let sale = &recent[choice - 1];
        writeln!(self.output, "\nAre you sure you want to cancel this sale?")?;
        writeln!(self.output, "Total: {}", sale.total())?;

        let Some(confirmation) = self.prompt("Enter 'yes' to confirm: ")? else {
            return Ok(());
        };
        if !confirmation.eq_ignore_ascii_case("yes") {
            writeln!(self.output, "Cancellation aborted.")?;
            return Ok(());
        }

        if self.sales.cancel_sale(&sale.id).await? {
            writeln!(self.output, "{}", style("Sale cancelled successfully.").green())?;
            writeln!(self.output, "Stock levels have been restored.")?;
        } else {
            writeln!(self.output, "{}", style("Failed to cancel sale.").red())?;
        }

        Ok(())
    }

    // =========================================================================
    // 4. Check Stock
    // =========================================================================

    async fn check_stock(&mut self) -> ActionResult {
        let products = self.products.list_all().await?;
        if products.is_empty() {
            writeln!(self.output, "No products found.")?;
            return Ok(());
        }

        for product in &products {
            writeln!(self.output, "Name: {}", product.name)?;
            writeln!(self.output, "Stock: {}", product.stock_quantity)?;
            writeln!(self.output)?;
        }

        Ok(())
    }
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format(DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cornershop_db::{seed, Database, DbConfig};

    async fn services() -> (ProductService, SaleService) {
        console::set_colors_enabled(false);
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed::seed_if_empty(&db).await.unwrap();
        (ProductService::new(db.clone()), SaleService::new(db))
    }

    async fn session(products: &ProductService, sales: &SaleService, script: &str) -> String {
        let mut shell = Shell::new(
            products.clone(),
            sales.clone(),
            &ShopConfig::default(),
            script.as_bytes(),
            Vec::new(),
        );
        shell.run().await.unwrap();
        String::from_utf8(shell.into_output()).unwrap()
    }

    async fn stock(products: &ProductService, name: &str) -> i64 {
        products.get_by_name(name).await.unwrap().unwrap().stock_quantity
    }

    #[test]
    fn test_menu_choice_parse() {
        assert_eq!(MenuChoice::parse(" 2 "), Some(MenuChoice::RegisterSale));
        assert_eq!(MenuChoice::parse("5"), Some(MenuChoice::Exit));
        assert_eq!(MenuChoice::parse("6"), None);
        assert_eq!(MenuChoice::parse("exit"), None);
    }

    #[tokio::test]
    async fn test_search_prints_matches() {
        let (products, sales) = services().await;

        let out = session(&products, &sales, "1\napp\n1\nkiwi\n5\n").await;

        assert!(out.contains("Corner Shop Management System"));
        assert!(out.contains("Name: Apple"));
        assert!(out.contains("Name: Pineapple"));
        assert!(out.contains("Price: $1.99"));
        assert!(!out.contains("Name: Banana"));
        assert!(out.contains("No products found."));
    }

    #[tokio::test]
    async fn test_invalid_option_and_end_of_input() {
        let (products, sales) = services().await;

        let out = session(&products, &sales, "9\n").await;

        assert!(out.contains("Invalid option. Please try again."));
        assert_eq!(out.matches("Select an option:").count(), 2);
    }

    #[tokio::test]
    async fn test_register_sale_validates_each_line() {
        let (products, sales) = services().await;

        let script = "2\nSofa\nLaptop\nabc\nLaptop\n0\nLaptop\n6\nlaptop\n5\nApple\n3\ndone\n5\n";
        let out = session(&products, &sales, script).await;

        assert!(out.contains("Product not found."));
        assert_eq!(out.matches("Invalid quantity.").count(), 2);
        // 6 pending + 5 more exceeds the 10 in stock
        assert!(out.contains("Insufficient stock."));
        assert!(out.contains("Subtotal: $5999.94"));
        assert!(out.contains("Total: $6005.91"));
        assert!(out.contains("Sale registered successfully."));

        assert_eq!(stock(&products, "Laptop").await, 4);
        assert_eq!(stock(&products, "Apple").await, 97);
        assert_eq!(sales.get_recent_sales(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_register_sale_large_pending_quantities() {
        let (products, sales) = services().await;
        assert!(products.adjust_stock("Apple", 1400).await.unwrap());

        let out = session(&products, &sales, "2\nApple\n600\napple\n600\ndone\n5\n").await;

        assert!(!out.contains("Invalid quantity."));
        assert!(!out.contains("Insufficient stock."));
        assert_eq!(out.matches("Added 600 x Apple").count(), 2);
        assert!(out.contains("Total: $2388.00"));
        assert!(out.contains("Sale registered successfully."));
        assert_eq!(stock(&products, "Apple").await, 300);
    }

    #[tokio::test]
    async fn test_register_sale_without_items() {
        let (products, sales) = services().await;

        let out = session(&products, &sales, "2\nDONE\n5\n").await;

        assert!(out.contains("No items added to sale."));
        assert!(sales.get_recent_sales(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_abandoned_sale_leaves_stock_alone() {
        let (products, sales) = services().await;

        let out = session(&products, &sales, "2\nLaptop\n3\n").await;

        assert!(!out.contains("Sale registered"));
        assert_eq!(stock(&products, "Laptop").await, 10);
    }

    #[tokio::test]
    async fn test_cancel_requires_confirmation() {
        let (products, sales) = services().await;
        let line = products.check_sale_line("Orange", 4).await.unwrap();
        sales.create_sale(&[line]).await.unwrap();

        let out = session(&products, &sales, "3\n1\nno\n3\n7\n3\n0\n5\n").await;
        assert!(out.contains("Orange: 4 x $0.99"));
        assert!(out.contains("Cancellation aborted."));
        assert!(out.contains("Invalid selection."));
        assert_eq!(stock(&products, "Orange").await, 96);

        let out = session(&products, &sales, "3\n1\nYES\n5\n").await;
        assert!(out.contains("Sale cancelled successfully."));
        assert!(out.contains("Stock levels have been restored."));
        assert_eq!(stock(&products, "Orange").await, 100);

        let out = session(&products, &sales, "3\n5\n").await;
        assert!(out.contains("No recent sales found."));
    }

    #[tokio::test]
    async fn test_check_stock_lists_everything() {
        let (products, sales) = services().await;

        let out = session(&products, &sales, "4\n5\n").await;

        assert_eq!(out.matches("Stock: ").count(), 9);
        assert!(out.contains("Name: Desk Chair\nStock: 8"));
    }
}
