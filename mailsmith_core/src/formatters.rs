use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::DateTime;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use serde_json::Value;

use crate::values::as_number;
use crate::values::is_blank;
use crate::values::value_to_string;

/// A named transformation applied to a tag value through `{{key|name:arg}}`.
pub trait Formatter: Send + Sync {
	fn name(&self) -> &str;
	fn format(&self, value: &Value, argument: Option<&str>) -> String;
}

struct FnFormatter<F> {
	name: String,
	format: F,
}

impl<F> Formatter for FnFormatter<F>
where
	F: Fn(&Value, Option<&str>) -> String + Send + Sync,
{
	fn name(&self) -> &str {
		&self.name
	}

	fn format(&self, value: &Value, argument: Option<&str>) -> String {
		(self.format)(value, argument)
	}
}

/// Named formatters available to the tag engine.
#[derive(Clone)]
pub struct FormatterRegistry {
	formatters: BTreeMap<String, Arc<dyn Formatter>>,
}

impl fmt::Debug for FormatterRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FormatterRegistry")
			.field("formatters", &self.names())
			.finish()
	}
}

impl Default for FormatterRegistry {
	fn default() -> Self {
		Self::new()
	}
}

impl FormatterRegistry {
	/// A registry with no formatters at all.
	pub fn empty() -> Self {
		Self {
			formatters: BTreeMap::new(),
		}
	}

	/// A registry preloaded with `default`, `date`, `currency`, `uppercase`,
	/// `lowercase`, `capitalize`, `truncate`, `count` and `number`.
	pub fn new() -> Self {
		let mut registry = Self::empty();
		registry.register(DefaultFormatter);
		registry.register(DateFormatter);
		registry.register(CurrencyFormatter);
		registry.register(UppercaseFormatter);
		registry.register(LowercaseFormatter);
		registry.register(CapitalizeFormatter);
		registry.register(TruncateFormatter);
		registry.register(CountFormatter);
		registry.register(NumberFormatter);
		registry
	}

	/// Registers a formatter under its own name, replacing any formatter
	/// already registered with that name.
	pub fn register(&mut self, formatter: impl Formatter + 'static) {
		let name = formatter.name().to_string();
		self.formatters.insert(name, Arc::new(formatter));
	}

	/// Registers a closure as a formatter.
	pub fn register_fn<F>(&mut self, name: impl Into<String>, format: F)
	where
		F: Fn(&Value, Option<&str>) -> String + Send + Sync + 'static,
	{
		self.register(FnFormatter {
			name: name.into(),
			format,
		});
	}

	pub fn has(&self, name: &str) -> bool {
		self.formatters.contains_key(name)
	}

	pub fn get(&self, name: &str) -> Option<&dyn Formatter> {
		self.formatters.get(name).map(|formatter| &**formatter)
	}

	pub fn names(&self) -> Vec<&str> {
		self.formatters.keys().map(String::as_str).collect()
	}

	/// Applies the named formatter. Unknown names fall back to the plain
	/// string form for scalars and an empty string for arrays and objects.
	pub fn apply(&self, name: &str, value: &Value, argument: Option<&str>) -> String {
		match self.get(name) {
			Some(formatter) => formatter.format(value, argument),
			None => {
				match value {
					Value::Array(_) | Value::Object(_) => String::new(),
					scalar => value_to_string(scalar),
				}
			}
		}
	}
}

/// Substitutes the argument when the value is null or empty.
pub struct DefaultFormatter;

impl Formatter for DefaultFormatter {
	fn name(&self) -> &str {
		"default"
	}

	fn format(&self, value: &Value, argument: Option<&str>) -> String {
		if is_blank(Some(value)) {
			argument.unwrap_or_default().to_string()
		} else {
			value_to_string(value)
		}
	}
}

/// Formats dates using PHP style format letters (`Y-m-d` by default).
/// Numeric values are unix timestamps. Unparseable input is returned as is.
pub struct DateFormatter;

impl Formatter for DateFormatter {
	fn name(&self) -> &str {
		"date"
	}

	fn format(&self, value: &Value, argument: Option<&str>) -> String {
		if is_blank(Some(value)) {
			return String::new();
		}

		let pattern = php_date_format_to_chrono(argument.unwrap_or("Y-m-d"));

		match parse_date_value(value) {
			Some(date) => date.format(&pattern).to_string(),
			None => {
				tracing::debug!(value = %value, "date formatter could not parse value");
				value_to_string(value)
			}
		}
	}
}

fn parse_date_value(value: &Value) -> Option<NaiveDateTime> {
	if let Some(timestamp) = as_number(value) {
		return DateTime::from_timestamp(timestamp.trunc() as i64, 0).map(|date| date.naive_utc());
	}

	let text = value.as_str()?.trim();

	if let Ok(date) = DateTime::parse_from_rfc3339(text) {
		return Some(date.naive_local());
	}

	for pattern in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
		if let Ok(date) = NaiveDateTime::parse_from_str(text, pattern) {
			return Some(date);
		}
	}

	for pattern in ["%Y-%m-%d", "%Y/%m/%d", "%B %d, %Y", "%d %B %Y"] {
		if let Ok(date) = NaiveDate::parse_from_str(text, pattern) {
			return date.and_hms_opt(0, 0, 0);
		}
	}

	None
}

/// Translates PHP `date()` format letters into a chrono format string.
/// Letters without a chrono equivalent are copied literally.
pub fn php_date_format_to_chrono(format: &str) -> String {
	let mut output = String::with_capacity(format.len() * 2);
	let mut chars = format.chars();

	while let Some(ch) = chars.next() {
		let translated = match ch {
			'd' => "%d",
			'j' => "%-d",
			'D' => "%a",
			'l' => "%A",
			'N' => "%u",
			'w' => "%w",
			'z' => "%-j",
			'W' => "%V",
			'F' => "%B",
			'M' => "%b",
			'm' => "%m",
			'n' => "%-m",
			'Y' => "%Y",
			'y' => "%y",
			'a' => "%P",
			'A' => "%p",
			'g' => "%-I",
			'G' => "%-H",
			'h' => "%I",
			'H' => "%H",
			'i' => "%M",
			's' => "%S",
			'U' => "%s",
			'%' => "%%",
			'\\' => {
				if let Some(escaped) = chars.next() {
					push_literal(&mut output, escaped);
				}
				continue;
			}
			other => {
				push_literal(&mut output, other);
				continue;
			}
		};

		output.push_str(translated);
	}

	output
}

fn push_literal(output: &mut String, ch: char) {
	if ch == '%' {
		output.push_str("%%");
	} else {
		output.push(ch);
	}
}

/// Formats an amount with a currency symbol and two decimals.
pub struct CurrencyFormatter;

impl CurrencyFormatter {
	pub fn symbol(code: &str) -> Option<&'static str> {
		let symbol = match code {
			"USD" => "$",
			"EUR" => "€",
			"GBP" => "£",
			"JPY" => "¥",
			"CAD" => "CA$",
			"AUD" => "A$",
			"CHF" => "CHF",
			_ => return None,
		};

		Some(symbol)
	}
}

impl Formatter for CurrencyFormatter {
	fn name(&self) -> &str {
		"currency"
	}

	fn format(&self, value: &Value, argument: Option<&str>) -> String {
		if is_blank(Some(value)) {
			return String::new();
		}

		let amount = as_number(value).unwrap_or_default();
		let code = argument.map_or("USD", str::trim);
		let formatted = format_number(amount, 2);

		match Self::symbol(code) {
			Some(symbol) => format!("{symbol}{formatted}"),
			None => format!("{code} {formatted}"),
		}
	}
}

pub struct UppercaseFormatter;

impl Formatter for UppercaseFormatter {
	fn name(&self) -> &str {
		"uppercase"
	}

	fn format(&self, value: &Value, _argument: Option<&str>) -> String {
		value_to_string(value).to_uppercase()
	}
}

pub struct LowercaseFormatter;

impl Formatter for LowercaseFormatter {
	fn name(&self) -> &str {
		"lowercase"
	}

	fn format(&self, value: &Value, _argument: Option<&str>) -> String {
		value_to_string(value).to_lowercase()
	}
}

/// Title cases every word: the first letter goes upper case, the rest lower.
pub struct CapitalizeFormatter;

impl Formatter for CapitalizeFormatter {
	fn name(&self) -> &str {
		"capitalize"
	}

	fn format(&self, value: &Value, _argument: Option<&str>) -> String {
		let text = value_to_string(value);
		let mut output = String::with_capacity(text.len());
		let mut at_word_start = true;

		for ch in text.chars() {
			if ch.is_alphanumeric() {
				if at_word_start {
					output.extend(ch.to_uppercase());
				} else {
					output.extend(ch.to_lowercase());
				}
				at_word_start = false;
			} else {
				output.push(ch);
				at_word_start = ch != '\'';
			}
		}

		output
	}
}

/// Cuts text down to a number of characters (100 by default) and appends
/// `...` when anything was removed.
pub struct TruncateFormatter;

impl TruncateFormatter {
	pub const DEFAULT_LENGTH: usize = 100;
	pub const SUFFIX: &'static str = "...";
}

impl Formatter for TruncateFormatter {
	fn name(&self) -> &str {
		"truncate"
	}

	fn format(&self, value: &Value, argument: Option<&str>) -> String {
		let text = value_to_string(value);
		let length = argument
			.and_then(|argument| argument.trim().parse::<usize>().ok())
			.unwrap_or(Self::DEFAULT_LENGTH);

		if text.chars().count() <= length {
			return text;
		}

		let mut truncated: String = text.chars().take(length).collect();
		truncated.push_str(Self::SUFFIX);
		truncated
	}
}

/// Counts items in arrays and objects, or characters in strings.
pub struct CountFormatter;

impl Formatter for CountFormatter {
	fn name(&self) -> &str {
		"count"
	}

	fn format(&self, value: &Value, _argument: Option<&str>) -> String {
		let count = match value {
			Value::Null => 0,
			Value::Array(items) => items.len(),
			Value::Object(map) => map.len(),
			Value::String(text) => text.chars().count(),
			Value::Bool(_) | Value::Number(_) => 1,
		};

		count.to_string()
	}
}

/// Groups thousands with `,` and rounds to the given number of decimals
/// (zero by default). Null and empty values render as nothing; other
/// non-numeric values count as zero.
pub struct NumberFormatter;

impl Formatter for NumberFormatter {
	fn name(&self) -> &str {
		"number"
	}

	fn format(&self, value: &Value, argument: Option<&str>) -> String {
		if is_blank(Some(value)) {
			return String::new();
		}

		let number = as_number(value).unwrap_or_default();
		let decimals = argument
			.and_then(|argument| argument.trim().parse::<u8>().ok())
			.map_or(0, usize::from);

		format_number(number, decimals)
	}
}

/// The most decimals [`format_number`] will print.
pub const MAX_DECIMALS: usize = 20;

/// Rounds half away from zero and inserts `,` between thousands. Precision
/// is capped at [`MAX_DECIMALS`].
pub fn format_number(number: f64, decimals: usize) -> String {
	let decimals = decimals.min(MAX_DECIMALS);
	let factor = 10_f64.powi(decimals as i32);
	let rounded = (number.abs() * factor).round() / factor;
	let fixed = format!("{rounded:.decimals$}");
	let (integer, fraction) = match fixed.split_once('.') {
		Some((integer, fraction)) => (integer, Some(fraction)),
		None => (fixed.as_str(), None),
	};

	let mut grouped = String::with_capacity(fixed.len() + integer.len() / 3 + 1);
	if number < 0.0 && rounded > 0.0 {
		grouped.push('-');
	}

	for (index, digit) in integer.chars().enumerate() {
		if index > 0 && (integer.len() - index) % 3 == 0 {
			grouped.push(',');
		}
		grouped.push(digit);
	}

	if let Some(fraction) = fraction {
		grouped.push('.');
		grouped.push_str(fraction);
	}

	grouped
}
