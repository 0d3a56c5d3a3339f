use clap::{Args, Parser, Subcommand, ValueEnum};
use shopdesk::EntityId;
use std::convert::Infallible;
use std::path::PathBuf;

/// Numeric ids are integers, anything else is kept as text.
fn parse_id(raw: &str) -> Result<EntityId, Infallible> {
    raw.parse()
}

/// shopdesk - back office for the shop's hosted store
#[derive(Parser, Debug)]
#[command(name = "shopdesk")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Operator e-mail
    #[arg(long, env = "SHOPDESK_EMAIL")]
    pub email: String,

    /// Operator password
    #[arg(long, env = "SHOPDESK_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Keep a JSON snapshot of the product list at this path
    #[arg(long, env = "SHOPDESK_CACHE")]
    pub cache: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset (e.g. warn, shopdesk=debug)
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Product catalogue and stock
    #[command(subcommand)]
    Products(ProductCommands),

    /// Customer orders
    #[command(subcommand)]
    Orders(OrderCommands),

    /// Discount coupons
    #[command(subcommand)]
    Coupons(CouponCommands),

    /// Every customer's cart, grouped by customer
    Carts,
}

#[derive(Subcommand, Debug)]
pub enum ProductCommands {
    /// List products
    #[command(alias = "ls")]
    List {
        /// Only products whose name or brand contains this text
        #[arg(short, long)]
        search: Option<String>,

        /// Only products below the low-stock threshold
        #[arg(long)]
        low_stock: bool,
    },

    /// Move a product's stock by a signed number of units
    Adjust {
        #[arg(value_parser = parse_id)]
        id: EntityId,
        #[arg(allow_hyphen_values = true)]
        delta: i64,
    },

    /// Set a product's price
    Price {
        #[arg(value_parser = parse_id)]
        id: EntityId,
        price: f64,
    },

    /// Switch a product flag on or off
    Flag {
        #[arg(value_parser = parse_id)]
        id: EntityId,
        #[arg(value_enum)]
        flag: FlagArg,
        /// Switch the flag off instead of on
        #[arg(long)]
        off: bool,
    },

    /// Create a product
    Add(NewProductArgs),

    /// Delete a product
    #[command(alias = "rm")]
    Delete {
        #[arg(value_parser = parse_id)]
        id: EntityId,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum FlagArg {
    Promotion,
    FreeShipping,
    Featured,
}

#[derive(Args, Debug)]
pub struct NewProductArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long, default_value = "")]
    pub brand: String,

    #[arg(long)]
    pub price: f64,

    /// Units on hand; stored as a single default variant
    #[arg(long, default_value = "0")]
    pub inventory: u32,

    /// Futsal, Campo or Society
    #[arg(long, default_value = "Futsal")]
    pub category: String,

    /// Comma-separated colors
    #[arg(long, value_delimiter = ',')]
    pub colors: Vec<String>,

    #[arg(long, default_value = "")]
    pub image_url: String,

    #[arg(long)]
    pub promotion: bool,

    #[arg(long)]
    pub free_shipping: bool,
}

#[derive(Subcommand, Debug)]
pub enum OrderCommands {
    /// List orders, newest first
    #[command(alias = "ls")]
    List {
        /// Only orders without a tracking code
        #[arg(long)]
        untracked: bool,
    },

    /// Set the shipment tracking code of an order
    Track {
        #[arg(value_parser = parse_id)]
        id: EntityId,
        code: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum CouponCommands {
    /// List coupons, newest first
    #[command(alias = "ls")]
    List,

    /// Check whether a code would be accepted now
    Validate {
        code: String,

        /// Also print the discount on a cart of this total
        #[arg(long)]
        total: Option<f64>,
    },

    /// Create a coupon
    Create(NewCouponArgs),

    /// Activate or deactivate a coupon
    Activate {
        #[arg(value_parser = parse_id)]
        id: EntityId,
        #[arg(long)]
        off: bool,
    },

    /// Delete a coupon
    #[command(alias = "rm")]
    Delete {
        #[arg(value_parser = parse_id)]
        id: EntityId,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum DiscountArg {
    Percentage,
    Fixed,
}

#[derive(Args, Debug)]
pub struct NewCouponArgs {
    #[arg(long)]
    pub code: String,

    #[arg(long = "type", value_enum, default_value = "percentage")]
    pub discount_type: DiscountArg,

    #[arg(long)]
    pub value: f64,

    /// Expiration date, e.g. 2026-12-31
    #[arg(long)]
    pub expires: String,

    /// Uses allowed in total
    #[arg(long, default_value = "1")]
    pub limit: u32,

    /// Create the coupon switched off
    #[arg(long)]
    pub inactive: bool,

    #[arg(long)]
    pub first_purchase_only: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut full = vec!["shopdesk", "--email", "a@b.com", "--password", "secret"];
        full.extend_from_slice(args);
        Cli::try_parse_from(full).unwrap()
    }

    #[test]
    fn test_negative_delta_parses() {
        let cli = parse(&["products", "adjust", "7", "-3"]);
        match cli.command {
            Commands::Products(ProductCommands::Adjust { id, delta }) => {
                assert_eq!(id, EntityId::Int(7));
                assert_eq!(delta, -3);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_text_ids_and_flags() {
        let cli = parse(&["products", "flag", "abc-1", "free-shipping", "--off"]);
        match cli.command {
            Commands::Products(ProductCommands::Flag { id, flag, off }) => {
                assert_eq!(id, EntityId::Text("abc-1".into()));
                assert!(matches!(flag, FlagArg::FreeShipping));
                assert!(off);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_coupon_create_defaults() {
        let cli = parse(&["coupons", "create", "--code", "sale", "--value", "10", "--expires", "2026-12-31"]);
        match cli.command {
            Commands::Coupons(CouponCommands::Create(args)) => {
                assert!(matches!(args.discount_type, DiscountArg::Percentage));
                assert_eq!(args.limit, 1);
                assert!(!args.inactive);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
