use facturiolib::{
    formats::csv::{Csv, COL_AMOUNT, COL_INVOICE_NUMBER, COL_PHONE, COL_RECEIPT},
    traits::ReadFormat,
};
use rust_decimal::Decimal;
use std::io::Cursor;

#[test]
fn tab_separated_with_english_invoice_column() {
    let input = "Nombre\tTelefono\tLote\tInvoice Number\tCuota\tPendiente\tOcupa Recibo\n\
                 María\t 55 12 \tA-1\tF-9\t1,5\t-5\tYes\n";
    let rows = Csv::read(Cursor::new(input)).expect("read");
    assert_eq!(rows.len(), 1);
    let r = &rows[0];
    assert_eq!(r.text(COL_INVOICE_NUMBER).as_deref(), Some("F-9"));
    assert_eq!(r.text(COL_PHONE).as_deref(), Some(" 55 12 "));
    assert_eq!(r.text(COL_RECEIPT).as_deref(), Some("Yes"));
    // "1,5" не число
    assert_eq!(r.number(COL_AMOUNT), Some(Decimal::ZERO));
    assert_eq!(r.number("pendiente"), Some(Decimal::new(-5, 0)));
}
