//! Orderable services offered through the inline order menu.

/// Callback data carried by the "Cancel" button of the order menu
pub const CANCEL_ACTION: &str = "cancel_order";

/// One orderable service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceCatalogEntry {
    /// Callback data identifying the service in the inline menu
    pub key: &'static str,
    pub label: &'static str,
    /// Starting price, 0 means the service is free
    pub price_minor: i64,
    pub emoji: &'static str,
}

/// The read-only service table, in menu order
pub static CATALOG: [ServiceCatalogEntry; 4] = [
    ServiceCatalogEntry {
        key: "order_parse",
        label: "Парсинг данных",
        price_minor: 3000,
        emoji: "📊",
    },
    ServiceCatalogEntry {
        key: "order_excel",
        label: "Автоматизация Excel",
        price_minor: 1000,
        emoji: "📋",
    },
    ServiceCatalogEntry {
        key: "order_bot",
        label: "Разработка бота",
        price_minor: 8000,
        emoji: "🤖",
    },
    ServiceCatalogEntry {
        key: "order_consultation",
        label: "Консультация",
        price_minor: 0,
        emoji: "💬",
    },
];

/// Look up a catalog entry by its callback key
pub fn resolve(action_id: &str) -> Option<&'static ServiceCatalogEntry> {
    CATALOG.iter().find(|entry| entry.key == action_id)
}

impl ServiceCatalogEntry {
    pub fn is_free(&self) -> bool {
        self.price_minor == 0
    }

    /// Price as shown to users: "от 3 000₽", or "Бесплатно" for free services
    pub fn price_text(&self) -> String {
        if self.is_free() {
            "Бесплатно".to_string()
        } else {
            format!("от {}₽", group_thousands(self.price_minor))
        }
    }

    /// Label of the inline button offering this service
    pub fn button_label(&self) -> String {
        format!(
            "{} {} ({})",
            self.emoji,
            self.label,
            self.price_text().to_lowercase()
        )
    }
}

/// Format an amount with a space between groups of three digits
pub fn group_thousands(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(ch);
    }

    if amount < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}
