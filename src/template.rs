//! Sample workbook offered as an import template.

use std::path::Path;

use rust_xlsxwriter::{Format, Workbook};
use tracing::info;

use crate::field::Field;
use crate::record::Record;
use crate::IngestResult;

pub const TEMPLATE_SHEET: &str = "Employees";
pub const TEMPLATE_FILE_NAME: &str = "DATABASE_template.xlsx";

/// The single example row written below the header.
pub fn sample_record() -> Record {
    [
        (Field::EmployeeNumber, "60000"),
        (Field::ArabicName, "حسن فلاح المعصب"),
        (Field::EnglishName, "HASSAN FALAH ALMOASB"),
        (Field::CivilId, "293293293293"),
        (Field::CivilIdExpiry, "2026/06/29"),
        (Field::Nationality, "كويتي"),
        (Field::PassportNumber, "A12345678"),
        (Field::PassportExpiry, "2088/11/10"),
        (Field::UnifiedNumber, "123456789"),
        (Field::ContractDate, "1993/07/09"),
        (Field::ContractStatus, "منتهى"),
        (Field::WorkSite, "عماله وطنية الكويتيين - الإدارة الرئيسية"),
        (Field::JobTitle, "مدير عام"),
        (Field::WorkSchedule, "دوامين"),
        (Field::CurrentSalary, "800"),
        (Field::WorkPermitSalary, "700"),
        (Field::CompanyName, "شركة بروش انترناشونال لخدمات التنظيف"),
        (Field::AdminNotes, "باب خامس (الكويتيين)"),
        (Field::AdditionalNotes, "لا توجد إضافات"),
    ]
    .into_iter()
    .map(|(f, v)| (f.label(), v))
    .collect()
}

/// Builds the template workbook in memory: one header row of every field label
/// and one sample row.
pub fn template_workbook() -> IngestResult<Vec<u8>> {
    let sample = sample_record();
    let header = Format::new().set_bold();

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(TEMPLATE_SHEET)?;
    for (col, field) in (0u16..).zip(Field::ALL) {
        sheet.write_string_with_format(0, col, field.label(), &header)?;
        sheet.write_string(1, col, sample.field_or_empty(*field))?;
        sheet.set_column_width(col, 22)?;
    }

    Ok(workbook.save_to_buffer()?)
}

pub async fn write_template(path: &Path) -> IngestResult<()> {
    let bytes = template_workbook()?;
    tokio::fs::write(path, &bytes).await?;
    info!(path = %path.display(), bytes = bytes.len(), "wrote template workbook");
    Ok(())
}
