//! Order management
//!
//! The immutable order aggregate, its multi-party status state machine,
//! and the service that keeps every mutation atomic under one lock.
//!
//! Layout:
//! - `types/`: all type definitions
//! - `implementations/`: business logic on the aggregate and service

pub mod implementations;
pub mod types;

pub use types::*;

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{NaiveDate, Utc};

    use crate::{
        errors::MarketError,
        implementation::{
            cart_system::{CustomerId, DeliveryAddress},
            inventory::InMemoryInventory,
            payment::PaymentMethod,
        },
        types::{
            catalog::{Price, ProductCategory, ProductId, RestaurantId},
            geo::GeoPoint,
        },
    };

    use super::types::{
        Actor, AvailabilityValidation, DeliveryDetails, Order, OrderFilter, OrderId, OrderItem,
        OrderNumber, OrderService, OrderStatus, OrderTotals, PaymentStatus, RatingCommand,
        StockReservation,
    };

    fn test_item(product: &str, cents: u64, quantity: u32, category: ProductCategory) -> OrderItem {
        OrderItem {
            id:              format!("line-{product}"),
            product_id:      ProductId::new(product),
            title:           format!("Item {product}"),
            unit_price:      Price::eur(cents),
            image_url:       None,
            category,
            options:         Vec::new(),
            quantity,
            special_request: None,
            total_cents:     cents * u64::from(quantity),
        }
    }

    fn test_order(service: &OrderService, status: OrderStatus) -> Order {
        let items = vec![
            test_item("p-1", 1_000, 1, ProductCategory::PreparedFood),
            test_item("p-2", 1_500, 1, ProductCategory::Beverage),
        ];
        let subtotal: u64 = items.iter().map(|i| i.total_cents).sum();

        let mut order = Order {
            id:             OrderId::generate(),
            number:         service
                .next_order_number(Utc::now().date_naive())
                .expect("order number"),
            customer_id:    CustomerId::new("c-1"),
            restaurant_id:  RestaurantId::new("r-1"),
            courier_id:     None,
            items,
            availability:   AvailabilityValidation { checked_at: Utc::now(), dropped: Vec::new() },
            totals:         OrderTotals {
                subtotal_cents:     subtotal,
                delivery_fee_cents: 350,
                service_fee_cents:  50,
                discount_cents:     0,
                total_cents:        subtotal + 350 + 50,
            },
            delivery:       DeliveryDetails {
                address:       DeliveryAddress {
                    street:      "Stephansplatz 1".to_string(),
                    city:        "Vienna".to_string(),
                    postal_code: "1010".to_string(),
                    coordinates: GeoPoint::new(48.2086, 16.3730),
                },
                contact_phone: "+43 1 234567".to_string(),
                eta_minutes:   Some(30),
            },
            payment_method: PaymentMethod::Cash,
            payment_status: PaymentStatus::Pending,
            payment_ref:    None,
            status:         OrderStatus::Pending,
            tracking:       Vec::new(),
            rating:         None,
            reservations:   vec![StockReservation {
                product_id: ProductId::new("p-2"),
                quantity:   1,
            }],
            version:        0,
            created_at:     Utc::now(),
            updated_at:     Utc::now(),
        };

        // Walk the happy path up to the requested status.
        let partner = Actor::partner("r-1");
        let courier = Actor::courier("cr-1");
        let path = [
            (OrderStatus::Accepted, &partner),
            (OrderStatus::Preparing, &partner),
            (OrderStatus::ReadyForPickup, &partner),
            (OrderStatus::OutForDelivery, &courier),
            (OrderStatus::Delivered, &courier),
        ];
        for (next, actor) in path {
            if order.status == status {
                break;
            }
            if next == OrderStatus::OutForDelivery {
                order.courier_id = Some(super::types::CourierId::new("cr-1"));
            }
            order.apply_transition(next, actor, None).expect("walk status path");
        }

        service.insert_order(order.clone()).expect("insert");
        order
    }

    #[test]
    fn happy_path_walks_the_full_machine() {
        let service = OrderService::new();
        let order = test_order(&service, OrderStatus::Pending);
        let partner = Actor::partner("r-1");
        let courier = Actor::courier("cr-1");

        service
            .transition(&order.id, OrderStatus::Accepted, &partner, None)
            .expect("accept");
        service
            .transition(&order.id, OrderStatus::Preparing, &partner, None)
            .expect("prepare");
        service
            .transition(&order.id, OrderStatus::ReadyForPickup, &partner, None)
            .expect("ready");
        service.claim(&order.id, &courier).expect("claim");
        let delivered = service
            .transition(&order.id, OrderStatus::Delivered, &courier, None)
            .expect("deliver");

        assert_eq!(delivered.status, OrderStatus::Delivered);
        // Every transition appended exactly one tracking entry.
        assert_eq!(delivered.tracking.len(), 5);
        // The cached status matches the log's last entry.
        assert_eq!(
            delivered.tracking.last().map(|e| e.status),
            Some(delivered.status)
        );
    }

    #[test]
    fn customer_cannot_accept_an_order() {
        let service = OrderService::new();
        let order = test_order(&service, OrderStatus::Pending);

        let result = service.transition(
            &order.id,
            OrderStatus::Accepted,
            &Actor::customer("c-1"),
            None,
        );
        assert!(matches!(result, Err(MarketError::InvalidTransition { .. })));

        // The order is untouched.
        let reloaded = service.order(&order.id).expect("reload");
        assert_eq!(reloaded.status, OrderStatus::Pending);
        assert!(reloaded.tracking.is_empty());
    }

    #[test]
    fn cancellation_window_closes_at_preparing() {
        let service = OrderService::new();
        let order = test_order(&service, OrderStatus::Preparing);

        let result = service.transition(
            &order.id,
            OrderStatus::Cancelled,
            &Actor::customer("c-1"),
            None,
        );
        assert!(matches!(result, Err(MarketError::InvalidTransition { .. })));
    }

    #[test]
    fn terminal_orders_refuse_all_mutation() {
        let service = OrderService::new();
        let order = test_order(&service, OrderStatus::Delivered);

        let result = service.transition(
            &order.id,
            OrderStatus::Pending,
            &Actor::partner("r-1"),
            None,
        );
        assert!(matches!(result, Err(MarketError::OrderClosed(_))));
    }

    #[test]
    fn concurrent_claims_have_exactly_one_winner() {
        let service = Arc::new(OrderService::new());
        let order = test_order(&service, OrderStatus::ReadyForPickup);

        let handles: Vec<_> = (0..2)
            .map(|i| {
                let service = Arc::clone(&service);
                let order_id = order.id.clone();
                std::thread::spawn(move || {
                    service.claim(&order_id, &Actor::courier(format!("cr-{i}")))
                })
            })
            .collect();

        let results: Vec<_> = handles
            .into_iter()
            .map(|h| h.join().expect("join"))
            .collect();

        let winners = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(MarketError::AlreadyClaimed(_)))));

        let reloaded = service.order(&order.id).expect("reload");
        assert_eq!(reloaded.status, OrderStatus::OutForDelivery);
        assert!(reloaded.courier_id.is_some());
    }

    #[test]
    fn claim_before_ready_is_invalid() {
        let service = OrderService::new();
        let order = test_order(&service, OrderStatus::Pending);

        let result = service.claim(&order.id, &Actor::courier("cr-1"));
        assert!(matches!(result, Err(MarketError::InvalidTransition { .. })));
    }

    #[tokio::test]
    async fn cancelling_a_paid_order_restores_stock_and_refunds() {
        let service = OrderService::new();
        let inventory = InMemoryInventory::new();
        inventory.set_stock(ProductId::new("p-2"), 4).expect("seed stock");

        let mut order = test_order(&service, OrderStatus::Pending);
        order.payment_method = PaymentMethod::Card;
        order.payment_status = PaymentStatus::Completed;
        order.payment_ref = Some("ch_test".to_string());
        // Replace the stored copy with the card-paid variant.
        service
            .orders
            .lock()
            .expect("lock")
            .insert(order.id.clone(), order.clone());

        let cancelled = service
            .cancel_order(&inventory, &order.id, &Actor::customer("c-1"), Some("changed my mind".to_string()))
            .await
            .expect("cancel");

        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(cancelled.payment_status, PaymentStatus::Refunded);
        // One reserved unit of p-2 went back on the shelf.
        assert_eq!(inventory.stock_level(&ProductId::new("p-2")).expect("level"), 5);
    }

    #[tokio::test]
    async fn cancelling_a_cash_pending_order_leaves_payment_alone() {
        let service = OrderService::new();
        let inventory = InMemoryInventory::new();
        inventory.set_stock(ProductId::new("p-2"), 4).expect("seed stock");

        let order = test_order(&service, OrderStatus::Pending);
        let cancelled = service
            .cancel_order(&inventory, &order.id, &Actor::partner("r-1"), None)
            .await
            .expect("cancel");

        assert_eq!(cancelled.payment_status, PaymentStatus::Pending);
        assert_eq!(inventory.stock_level(&ProductId::new("p-2")).expect("level"), 5);
    }

    #[test]
    fn rating_is_once_and_delivered_only() {
        let service = OrderService::new();
        let order = test_order(&service, OrderStatus::Delivered);
        let customer = Actor::customer("c-1");

        let first = RatingCommand {
            partner_rating: 5,
            courier_rating: Some(4),
            comment:        Some("fast and warm".to_string()),
        };
        let rated = service.rate(&order.id, &customer, &first).expect("first rating");
        assert_eq!(rated.rating.as_ref().map(|r| r.partner_rating), Some(5));

        let second = RatingCommand {
            partner_rating: 1,
            courier_rating: None,
            comment:        None,
        };
        let result = service.rate(&order.id, &customer, &second);
        assert!(matches!(result, Err(MarketError::AlreadyRated(_))));

        // First rating stands untouched.
        let reloaded = service.order(&order.id).expect("reload");
        assert_eq!(reloaded.rating.as_ref().map(|r| r.partner_rating), Some(5));
    }

    #[test]
    fn rating_an_undelivered_order_fails() {
        let service = OrderService::new();
        let order = test_order(&service, OrderStatus::OutForDelivery);

        let command = RatingCommand {
            partner_rating: 4,
            courier_rating: None,
            comment:        None,
        };
        let result = service.rate(&order.id, &Actor::customer("c-1"), &command);
        assert!(matches!(result, Err(MarketError::NotRatable(_))));
    }

    #[test]
    fn rating_out_of_bounds_is_rejected() {
        let service = OrderService::new();
        let order = test_order(&service, OrderStatus::Delivered);

        let command = RatingCommand {
            partner_rating: 6,
            courier_rating: None,
            comment:        None,
        };
        let result = service.rate(&order.id, &Actor::customer("c-1"), &command);
        assert!(matches!(result, Err(MarketError::Validation(_))));
    }

    #[test]
    fn order_numbers_are_date_prefixed_and_sequential() {
        let service = OrderService::new();
        let day = NaiveDate::from_ymd_opt(2026, 3, 14).expect("date");

        let first = service.next_order_number(day).expect("first");
        let second = service.next_order_number(day).expect("second");
        assert_eq!(first, OrderNumber::compose(day, 1));
        assert_eq!(first.as_str(), "ORD-20260314-0001");
        assert_eq!(second.as_str(), "ORD-20260314-0002");

        // Sequence resets on the next day.
        let next_day = NaiveDate::from_ymd_opt(2026, 3, 15).expect("date");
        let rolled = service.next_order_number(next_day).expect("rolled");
        assert_eq!(rolled.as_str(), "ORD-20260315-0001");
    }

    #[test]
    fn totals_reconcile_with_items() {
        let service = OrderService::new();
        let order = test_order(&service, OrderStatus::Pending);
        assert!(order.totals.reconciles_with(&order.items));

        let mut skewed = order.totals.clone();
        skewed.total_cents += 1;
        assert!(!skewed.reconciles_with(&order.items));
    }

    #[test]
    fn restaurant_listing_filters_by_status() {
        let service = OrderService::new();
        test_order(&service, OrderStatus::Pending);
        test_order(&service, OrderStatus::Preparing);

        let filter = OrderFilter {
            status: Some(OrderStatus::Pending),
            ..Default::default()
        };
        let pending = service
            .restaurant_orders(&RestaurantId::new("r-1"), &filter)
            .expect("list");
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].status, OrderStatus::Pending);
    }

    #[test]
    fn courier_pool_lists_unclaimed_ready_orders() {
        let service = OrderService::new();
        test_order(&service, OrderStatus::ReadyForPickup);
        test_order(&service, OrderStatus::Pending);

        let pool = service.available_for_courier().expect("pool");
        assert_eq!(pool.len(), 1);
        assert_eq!(pool[0].status, OrderStatus::ReadyForPickup);

        // A claimed order leaves the pool.
        service.claim(&pool[0].id, &Actor::courier("cr-9")).expect("claim");
        assert!(service.available_for_courier().expect("pool").is_empty());
    }
}
