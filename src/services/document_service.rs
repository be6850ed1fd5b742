// src/services/document_service.rs

use genpdf::{elements, style, Element};
use image::Luma;
use qrcode::QrCode;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::SettingsRepository,
    models::{report::FinancialReport, settings::AgencySettings, subscription::Subscription},
    services::{report_service::ReportService, subscription_service::SubscriptionService},
};

const DEFAULT_TITLE: &str = "FLOWTECH SYSTEMS";

#[derive(Clone)]
pub struct DocumentService {
    report_service: ReportService,
    subscription_service: SubscriptionService,
    settings_repo: SettingsRepository,
    fonts_dir: String,
}

fn pdf_error(e: impl std::fmt::Display) -> AppError {
    AppError::DocumentError(e.to_string())
}

impl DocumentService {
    pub fn new(
        report_service: ReportService,
        subscription_service: SubscriptionService,
        settings_repo: SettingsRepository,
        fonts_dir: String,
    ) -> Self {
        Self { report_service, subscription_service, settings_repo, fonts_dir }
    }

    pub async fn financial_report_pdf(&self, month: Option<&str>) -> Result<Vec<u8>, AppError> {
        let report = self.report_service.financial_report(month).await?;
        let settings = self.settings_repo.get_settings().await?;
        render_financial_report(&self.fonts_dir, &settings, &report)
    }

    pub async fn charge_pdf(&self, subscription_id: Uuid) -> Result<Vec<u8>, AppError> {
        let (subscription, client_name) = self.subscription_service.get_with_client(subscription_id).await?;
        let settings = self.settings_repo.get_settings().await?;
        render_charge(&self.fonts_dir, &settings, &subscription, &client_name)
    }
}

// =============================================================================
//  RENDERIZAÇÃO
// =============================================================================

fn new_document(fonts_dir: &str, title: String) -> Result<genpdf::Document, AppError> {
    // Carrega a fonte da pasta configurada (FONTS_DIR)
    let font_family = genpdf::fonts::from_files(fonts_dir, "Roboto", None)
        .map_err(|_| AppError::FontNotFound(format!("Fonte Roboto não encontrada em {}", fonts_dir)))?;

    let mut doc = genpdf::Document::new(font_family);
    doc.set_title(title);
    let mut decorator = genpdf::SimplePageDecorator::new();
    decorator.set_margins(10);
    doc.set_page_decorator(decorator);
    Ok(doc)
}

// Cabeçalho com os dados da agência
fn push_header(doc: &mut genpdf::Document, settings: &AgencySettings) {
    let title_text = settings.company_name.clone().unwrap_or_else(|| DEFAULT_TITLE.to_string());
    doc.push(elements::Paragraph::new(title_text).styled(style::Style::new().bold().with_font_size(18)));

    if let Some(document) = &settings.document {
        doc.push(
            elements::Paragraph::new(format!("CNPJ/CPF: {}", document)).styled(style::Style::new().with_font_size(10)),
        );
    }
    doc.push(elements::Break::new(1.5));
}

fn push_footer(doc: &mut genpdf::Document, settings: &AgencySettings) {
    let contact: Vec<&str> = [&settings.address, &settings.email, &settings.phone]
        .into_iter()
        .filter_map(|v| v.as_deref())
        .collect();
    if !contact.is_empty() {
        doc.push(elements::Break::new(2));
        doc.push(elements::Paragraph::new(contact.join(" | ")).styled(style::Style::new().italic().with_font_size(8)));
    }
}

fn render(doc: genpdf::Document) -> Result<Vec<u8>, AppError> {
    let mut buffer = Vec::new();
    doc.render(&mut buffer).map_err(pdf_error)?;
    Ok(buffer)
}

fn money_row(table: &mut elements::TableLayout, label: &str, value: rust_decimal::Decimal) -> Result<(), AppError> {
    table
        .row()
        .element(elements::Paragraph::new(label))
        .element(elements::Paragraph::new(format!("R$ {:.2}", value)))
        .push()
        .map_err(pdf_error)
}

pub fn render_financial_report(
    fonts_dir: &str,
    settings: &AgencySettings,
    report: &FinancialReport,
) -> Result<Vec<u8>, AppError> {
    let mut doc = new_document(fonts_dir, format!("Relatório financeiro {}", report.month))?;
    push_header(&mut doc, settings);

    doc.push(
        elements::Paragraph::new(format!("RELATÓRIO FINANCEIRO - {}", report.month))
            .styled(style::Style::new().bold().with_font_size(14)),
    );
    doc.push(elements::Paragraph::new(format!("Emitido em: {}", report.reference_date.format("%d/%m/%Y"))));
    doc.push(elements::Break::new(1.5));

    // --- RESUMO ---
    let mut summary = elements::TableLayout::new(vec![3, 2]);
    summary.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));
    money_row(&mut summary, "Recebido no mês", report.total_paid_this_month)?;
    money_row(&mut summary, "  Assinaturas pagas", report.paid_breakdown.paid_subscriptions)?;
    money_row(&mut summary, "  Pagamentos iniciais", report.paid_breakdown.initial_payments)?;
    money_row(&mut summary, "  Histórico de pagamentos", report.paid_breakdown.payment_history)?;
    money_row(&mut summary, "Pendente", report.total_pending)?;
    money_row(&mut summary, "Em atraso", report.total_overdue)?;
    money_row(&mut summary, "Previsto para o próximo mês", report.next_month_expected)?;
    doc.push(summary);
    doc.push(elements::Break::new(1.5));

    // --- PRÓXIMOS 30 DIAS ---
    let style_bold = style::Style::new().bold();
    doc.push(elements::Paragraph::new("VENCIMENTOS NOS PRÓXIMOS 30 DIAS").styled(style_bold));
    if report.due_next_30_days.is_empty() {
        doc.push(elements::Paragraph::new("Nenhum vencimento no período."));
    } else {
        let mut table = elements::TableLayout::new(vec![2, 4, 2]);
        table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));
        table
            .row()
            .element(elements::Paragraph::new("Vencimento").styled(style_bold))
            .element(elements::Paragraph::new("Descrição").styled(style_bold))
            .element(elements::Paragraph::new("Valor").styled(style_bold))
            .push()
            .map_err(pdf_error)?;
        for payment in &report.due_next_30_days {
            table
                .row()
                .element(elements::Paragraph::new(payment.due_date.format("%d/%m/%Y").to_string()))
                .element(elements::Paragraph::new(payment.description.clone().unwrap_or_else(|| "-".into())))
                .element(elements::Paragraph::new(format!("R$ {:.2}", payment.amount)))
                .push()
                .map_err(pdf_error)?;
        }
        doc.push(table);
    }
    doc.push(elements::Break::new(1.5));

    // --- RECEITA MENSAL ---
    doc.push(elements::Paragraph::new("RECEITA DOS ÚLTIMOS MESES").styled(style_bold));
    let mut revenue = elements::TableLayout::new(vec![3, 2]);
    revenue.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));
    for entry in &report.monthly_revenue {
        money_row(&mut revenue, &entry.month, entry.total)?;
    }
    doc.push(revenue);

    doc.push(elements::Break::new(1.5));
    doc.push(elements::Paragraph::new(format!(
        "Clientes: {} ativos, {} leads, {} pausados, {} encerrados",
        report.clients.ativo, report.clients.lead, report.clients.pausado, report.clients.encerrado
    )));

    push_footer(&mut doc, settings);
    render(doc)
}

pub fn render_charge(
    fonts_dir: &str,
    settings: &AgencySettings,
    subscription: &Subscription,
    client_name: &str,
) -> Result<Vec<u8>, AppError> {
    let mut doc = new_document(fonts_dir, format!("Cobrança {}", client_name))?;
    push_header(&mut doc, settings);

    doc.push(elements::Paragraph::new("COBRANÇA").styled(style::Style::new().bold().with_font_size(14)));
    doc.push(elements::Paragraph::new(format!("Cliente: {}", client_name)));
    if let Some(description) = &subscription.description {
        doc.push(elements::Paragraph::new(format!("Referente a: {}", description)));
    }
    doc.push(elements::Paragraph::new(format!("Vencimento: {}", subscription.due_date.format("%d/%m/%Y"))));
    if let Some(total) = subscription.total_installments {
        doc.push(elements::Paragraph::new(format!("Parcela {} de {}", subscription.current_installment, total)));
    }
    doc.push(elements::Break::new(1.5));

    let mut amount = elements::Paragraph::new(format!("VALOR: R$ {:.2}", subscription.amount));
    amount.set_alignment(genpdf::Alignment::Right);
    doc.push(amount.styled(style::Style::new().bold().with_font_size(12)));
    doc.push(elements::Break::new(2));

    // --- ÁREA DE PAGAMENTO (QR CODE) ---
    if let Some(key) = &settings.pix_key {
        doc.push(elements::Paragraph::new("PAGAMENTO VIA PIX").styled(style::Style::new().bold().with_font_size(12)));
        doc.push(elements::Paragraph::new(format!("Chave: {}", key)));
        doc.push(elements::Break::new(1));

        // QR Code simples com o texto da chave (não é o BR Code EMV completo)
        let code = QrCode::new(key.as_bytes()).map_err(pdf_error)?;
        let image_buffer = code.render::<Luma<u8>>().build();
        let dynamic_image = image::DynamicImage::ImageLuma8(image_buffer);

        let pdf_image = elements::Image::from_dynamic_image(dynamic_image)
            .map_err(pdf_error)?
            .with_scale(genpdf::Scale::new(0.5, 0.5));
        doc.push(pdf_image);
    }

    push_footer(&mut doc, settings);
    render(doc)
}
