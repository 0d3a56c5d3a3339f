use super::args::{
    Commands, CouponCommands, DiscountArg, FlagArg, NewCouponArgs, NewProductArgs, OrderCommands,
    ProductCommands,
};
use super::output;
use anyhow::{Context, Result, anyhow};
use shopdesk::{
    Category, CouponDraft, Dashboard, DiscountType, MutationOutcome, ProductDraft, ProductFlag,
};

impl From<FlagArg> for ProductFlag {
    fn from(flag: FlagArg) -> Self {
        match flag {
            FlagArg::Promotion => ProductFlag::Promotion,
            FlagArg::FreeShipping => ProductFlag::FreeShipping,
            FlagArg::Featured => ProductFlag::Featured,
        }
    }
}

impl From<DiscountArg> for DiscountType {
    fn from(arg: DiscountArg) -> Self {
        match arg {
            DiscountArg::Percentage => DiscountType::Percentage,
            DiscountArg::Fixed => DiscountType::Fixed,
        }
    }
}

impl From<NewProductArgs> for ProductDraft {
    fn from(args: NewProductArgs) -> Self {
        ProductDraft {
            sku: args.brand,
            image_url: args.image_url,
            category: Category::from(args.category),
            colors: args.colors,
            is_promotion: args.promotion,
            free_shipping: args.free_shipping,
            inventory: args.inventory,
            ..ProductDraft::new(&args.name, args.price)
        }
    }
}

impl From<NewCouponArgs> for CouponDraft {
    fn from(args: NewCouponArgs) -> Self {
        CouponDraft {
            code: args.code,
            discount_type: args.discount_type.into(),
            discount_value: args.value,
            expiration_date: args.expires,
            usage_limit_user: args.limit,
            is_active: !args.inactive,
            first_purchase_only: args.first_purchase_only,
        }
    }
}

/// Runs one command against a signed-in dashboard.
pub async fn run(dashboard: &mut Dashboard, command: Commands) -> Result<()> {
    match command {
        Commands::Products(command) => run_products(dashboard, command).await,
        Commands::Orders(command) => run_orders(dashboard, command).await,
        Commands::Coupons(command) => run_coupons(dashboard, command).await,
        Commands::Carts => {
            let groups = dashboard.cart_groups().await.context("failed to load carts")?;
            output::print_carts(&groups);
            Ok(())
        }
    }
}

async fn run_products(dashboard: &mut Dashboard, command: ProductCommands) -> Result<()> {
    dashboard
        .reload_products()
        .await
        .context("failed to load products")?;

    match command {
        ProductCommands::List { search, low_stock } => {
            dashboard.set_search(search.as_deref().unwrap_or(""));
            let visible = dashboard
                .visible_products()
                .into_iter()
                .filter(|p| !low_stock || p.is_low_stock());
            output::print_products(visible, dashboard.stats());
        }
        ProductCommands::Adjust { id, delta } => {
            let outcome = dashboard.adjust_inventory(&id, delta).await?;
            output::print_outcome("inventory", &outcome);
            if let Some(product) = dashboard.products().get(&id) {
                println!("{} now has {} unit(s)", product.name, product.inventory);
            }
            ensure_saved("inventory", &outcome)?;
        }
        ProductCommands::Price { id, price } => {
            let outcome = dashboard
                .update_price(&id, price)
                .await
                .context("price not accepted")?;
            output::print_outcome("price", &outcome);
            ensure_saved("price", &outcome)?;
        }
        ProductCommands::Flag { id, flag, off } => {
            let outcome = dashboard.set_flag(&id, flag.into(), !off).await?;
            output::print_outcome("flag", &outcome);
            ensure_saved("flag", &outcome)?;
        }
        ProductCommands::Add(args) => {
            let product = dashboard
                .add_product(args.into())
                .await
                .context("failed to add product")?;
            println!("created product {} ({})", product.id, product.name);
        }
        ProductCommands::Delete { id } => {
            let outcome = dashboard.delete_product(&id).await?;
            output::print_outcome("delete", &outcome);
            ensure_saved("delete", &outcome)?;
        }
    }
    Ok(())
}

async fn run_orders(dashboard: &mut Dashboard, command: OrderCommands) -> Result<()> {
    match command {
        OrderCommands::List { untracked } => {
            let orders = dashboard.reload_orders().await.context("failed to load orders")?;
            output::print_orders(orders.iter().filter(|o| !untracked || !o.has_tracking_code()));
        }
        OrderCommands::Track { id, code } => {
            dashboard
                .update_tracking_code(&id, &code)
                .await
                .with_context(|| format!("failed to set tracking code of order {}", id))?;
            println!("order {} tracking code set to {}", id, code.trim());
        }
    }
    Ok(())
}

async fn run_coupons(dashboard: &mut Dashboard, command: CouponCommands) -> Result<()> {
    match command {
        CouponCommands::List => {
            let coupons = dashboard.reload_coupons().await.context("failed to load coupons")?;
            output::print_coupons(coupons);
        }
        CouponCommands::Validate { code, total } => {
            let validation = dashboard
                .validate_coupon(&code)
                .await
                .context("failed to look up coupon")?;
            output::print_validation(&code.trim().to_uppercase(), &validation, total);
        }
        CouponCommands::Create(args) => {
            let coupon = dashboard
                .create_coupon(args.into())
                .await
                .context("failed to create coupon")?;
            println!("created coupon {} ({})", coupon.code, coupon.id);
        }
        CouponCommands::Activate { id, off } => {
            dashboard
                .set_coupon_active(&id, !off)
                .await
                .context("failed to update coupon")?;
            println!("coupon {} {}", id, if off { "deactivated" } else { "activated" });
        }
        CouponCommands::Delete { id } => {
            dashboard.delete_coupon(&id).await.context("failed to delete coupon")?;
            println!("coupon {} deleted", id);
        }
    }
    Ok(())
}

/// Turns a write the store refused into a non-zero exit.
fn ensure_saved(what: &str, outcome: &MutationOutcome) -> Result<()> {
    match outcome.error() {
        Some(error) => Err(anyhow!("{} was not saved: {}", what, error)),
        None => Ok(()),
    }
}
