use super::model::{
    AdditionalService, ContractInfo, Discount, MainService, PaymentMethod, PaymentSchedule,
    PaymentStage, ServicesCatalog,
};

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

impl ServicesCatalog {
    /// Catalog the service starts with; edits live until the process exits.
    pub fn seed() -> Self {
        Self {
            main_services: vec![
                MainService {
                    id: 1,
                    name: "Категория B (механика)".to_string(),
                    category: "B".to_string(),
                    description: "Обучение вождению легкового автомобиля с механической коробкой передач".to_string(),
                    price: 45_000,
                    duration: "2,5 месяца".to_string(),
                    theory_hours: 134,
                    practice_hours: 56,
                    features: strings(&[
                        "Теория онлайн и в классе",
                        "Вождение на автодроме и в городе",
                        "Подготовка к экзамену в ГИБДД",
                    ]),
                    popular: true,
                },
                MainService {
                    id: 2,
                    name: "Категория B (автомат)".to_string(),
                    category: "B".to_string(),
                    description: "Обучение вождению легкового автомобиля с автоматической коробкой передач".to_string(),
                    price: 48_000,
                    duration: "2,5 месяца".to_string(),
                    theory_hours: 134,
                    practice_hours: 54,
                    features: strings(&[
                        "Современные автомобили с АКПП",
                        "Гибкий график вождения",
                    ]),
                    popular: false,
                },
                MainService {
                    id: 3,
                    name: "Категория A".to_string(),
                    category: "A".to_string(),
                    description: "Обучение вождению мотоцикла".to_string(),
                    price: 25_000,
                    duration: "1,5 месяца".to_string(),
                    theory_hours: 108,
                    practice_hours: 18,
                    features: strings(&["Экипировка предоставляется", "Закрытая площадка"]),
                    popular: false,
                },
            ],
            additional_services: vec![
                AdditionalService {
                    id: 1,
                    name: "Дополнительное занятие по вождению".to_string(),
                    description: "Занятие с инструктором на учебном автомобиле".to_string(),
                    price: 1_500,
                    unit: "за 1 час".to_string(),
                },
                AdditionalService {
                    id: 2,
                    name: "Аренда автомобиля на экзамен".to_string(),
                    description: "Учебный автомобиль для сдачи практического экзамена".to_string(),
                    price: 3_000,
                    unit: "за экзамен".to_string(),
                },
                AdditionalService {
                    id: 3,
                    name: "Медицинская справка".to_string(),
                    description: "Помощь в оформлении медицинского заключения".to_string(),
                    price: 2_500,
                    unit: "за услугу".to_string(),
                },
            ],
            payment_methods: vec![
                PaymentMethod {
                    id: 1,
                    name: "Наличные".to_string(),
                    description: "Оплата в офисе автошколы".to_string(),
                    enabled: true,
                },
                PaymentMethod {
                    id: 2,
                    name: "Банковская карта".to_string(),
                    description: "Visa, MasterCard, МИР".to_string(),
                    enabled: true,
                },
                PaymentMethod {
                    id: 3,
                    name: "Материнский капитал".to_string(),
                    description: "Оплата обучения средствами материнского капитала".to_string(),
                    enabled: true,
                },
            ],
            payment_schedule: PaymentSchedule {
                installments_available: true,
                stages: vec![
                    PaymentStage {
                        name: "При заключении договора".to_string(),
                        description: "Первый взнос".to_string(),
                        percent: 30,
                    },
                    PaymentStage {
                        name: "После теоретического курса".to_string(),
                        description: "Второй взнос".to_string(),
                        percent: 40,
                    },
                    PaymentStage {
                        name: "До начала вождения".to_string(),
                        description: "Окончательный расчёт".to_string(),
                        percent: 30,
                    },
                ],
                note: "Рассрочка без процентов на весь период обучения".to_string(),
            },
            discounts: vec![
                Discount {
                    id: 1,
                    name: "Студентам".to_string(),
                    description: "Скидка для студентов очной формы обучения".to_string(),
                    percent: 10,
                    conditions: "При предъявлении студенческого билета".to_string(),
                    active: true,
                },
                Discount {
                    id: 2,
                    name: "Приведи друга".to_string(),
                    description: "Скидка обоим при совместной записи".to_string(),
                    percent: 5,
                    conditions: "Договоры заключаются в один день".to_string(),
                    active: true,
                },
            ],
            contract_info: ContractInfo {
                organization_name: "АНО ДПО «Автошкола РУЛЬ+»".to_string(),
                inn: "0000000000".to_string(),
                ogrn: "0000000000000".to_string(),
                legal_address: "г. Москва, ул. Примерная, д. 1".to_string(),
                bank_details: "р/с 40703810000000000000, БИК 044525000".to_string(),
                contract_url: Some("/documents/contract.pdf".to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_schedule_sums_to_full_price() {
        assert_eq!(ServicesCatalog::seed().payment_schedule.total_percent(), 100);
    }

    #[test]
    fn seed_ids_are_unique() {
        let catalog = ServicesCatalog::seed();
        let mut ids: Vec<u64> = catalog.main_services.iter().map(|s| s.id).collect();
        ids.dedup();
        assert_eq!(ids.len(), catalog.main_services.len());
    }
}
