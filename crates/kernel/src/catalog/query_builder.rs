//! Listing query builder using SeaQuery.
//!
//! Generates the page and count queries for a [`ListingQuery`]. Both share
//! the same WHERE clause so the count always covers exactly the rows the
//! paginated query walks through.

use sea_query::extension::postgres::PgExpr;
use sea_query::{Asterisk, Expr, Iden, Order, PostgresQueryBuilder, Query, SelectStatement};

use super::{ListingQuery, OfferPredicate, SortOrder};

/// Columns of the `offers` table used by listings.
#[derive(Iden)]
pub enum Offers {
    Table,
    Id,
    Name,
    Price,
}

/// Build the paginated, sorted SELECT of offer summaries.
pub fn build_select(query: &ListingQuery) -> String {
    let mut select = Query::select();
    select
        .columns([Offers::Id, Offers::Name, Offers::Price])
        .from(Offers::Table);

    add_predicate(&mut select, &query.predicate);

    // Every ordering ends on the primary key so pages never overlap.
    match query.sort {
        SortOrder::Natural => {
            select.order_by(Offers::Id, Order::Asc);
        }
        SortOrder::PriceAsc => {
            select
                .order_by(Offers::Price, Order::Asc)
                .order_by(Offers::Id, Order::Asc);
        }
        SortOrder::PriceDesc => {
            select
                .order_by(Offers::Price, Order::Desc)
                .order_by(Offers::Id, Order::Asc);
        }
    }

    select.limit(query.limit());
    select.offset(query.offset());

    select.to_string(PostgresQueryBuilder)
}

/// Build a COUNT query over the filter predicate only.
pub fn build_count(predicate: &OfferPredicate) -> String {
    let mut select = Query::select();
    select.expr(Expr::col(Asterisk).count()).from(Offers::Table);

    add_predicate(&mut select, predicate);

    select.to_string(PostgresQueryBuilder)
}

fn add_predicate(select: &mut SelectStatement, predicate: &OfferPredicate) {
    select
        .and_where(Expr::col(Offers::Price).gte(predicate.price_min))
        .and_where(Expr::col(Offers::Price).lte(predicate.price_max));

    if !predicate.title.is_empty() {
        select.and_where(
            Expr::col(Offers::Name).ilike(format!("%{}%", escape_like_wildcards(&predicate.title))),
        );
    }
}

/// Escape SQL LIKE wildcards so titles match literally.
fn escape_like_wildcards(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
